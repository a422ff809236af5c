/// Tuning knobs of the SWIFT filter that are independent of the error rate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwiftParameters {
    /// Lower bound for every bucket threshold
    pub min_threshold: usize,
    /// Lower bound for log2 of the bucket height
    pub min_log2_delta: u32,
    /// Minimum haystack distance between two counted q-grams in one bucket
    pub taboo_length: usize,
    /// Show a progress bar while scanning
    pub progress: bool,
}

impl Default for SwiftParameters {
    fn default() -> Self {
        Self {
            min_threshold: 1,
            min_log2_delta: 0,
            taboo_length: 1,
            progress: false,
        }
    }
}

impl SwiftParameters {
    /// Settings used by the STELLAR pipeline (buckets at least 16 diagonals high)
    pub fn stellar() -> Self {
        Self {
            min_log2_delta: 4,
            ..Self::default()
        }
    }
}

/// Filter variant selected at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterMode {
    /// Hits span the whole query and are reported when a bucket reaches its
    /// threshold; otherwise hits are local parallelograms reported when a
    /// bucket is recycled or at the end of the scan.
    pub semiglobal: bool,
    /// Diagonal buckets; rectangular buckets are only available semiglobally
    pub diagonal: bool,
    /// Mismatches only: banding is computed for zero errors
    pub hamming_only: bool,
}

impl Default for FilterMode {
    fn default() -> Self {
        Self::local()
    }
}

impl FilterMode {
    pub fn local() -> Self {
        Self {
            semiglobal: false,
            diagonal: true,
            hamming_only: false,
        }
    }

    pub fn semiglobal() -> Self {
        Self {
            semiglobal: true,
            diagonal: true,
            hamming_only: false,
        }
    }

    pub fn semiglobal_hamming() -> Self {
        Self {
            semiglobal: true,
            diagonal: true,
            hamming_only: true,
        }
    }

    /// Semiglobal filtering with rectangular buckets
    pub fn quasar() -> Self {
        Self {
            semiglobal: true,
            diagonal: false,
            hamming_only: false,
        }
    }
}

/// How a verifier turns a candidate window into eps-matches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VerificationStrategy {
    /// Every local alignment in the band is split and extended
    #[default]
    Exact,
    /// Only the best local alignment is split and extended
    BestLocal,
}

impl std::str::FromStr for VerificationStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "exact" => Ok(VerificationStrategy::Exact),
            "bestlocal" | "best-local" => Ok(VerificationStrategy::BestLocal),
            _ => Err(format!(
                "Unknown verification strategy: {}. Use 'exact' or 'best-local'",
                s
            )),
        }
    }
}
