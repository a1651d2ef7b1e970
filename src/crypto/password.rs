//! Random password generation
//!
//! Passwords are drawn from a character pool selected by a complexity
//! level. Candidates are redrawn until they contain every required
//! character class or the deadline expires.

use std::time::{Duration, Instant};
use rand::Rng;
use thiserror::Error;

const LOWER_LETTERS: &str = "abcdefghijklmnopqrstuvwxyz";
const UPPER_LETTERS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &str = "0123456789";

/// Symbols added at complexity 1
pub const SAFE_SYMBOLS: &str = "@%-_+=~";

/// Symbols added at complexity 2 (all ASCII punctuation)
pub const ALL_SYMBOLS: &str = "!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";

/// Character-class breadth used during generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Complexity {
    /// Alphanumeric characters only
    #[default]
    Alphanumeric,
    /// Alphanumeric plus reasonably safe symbols
    SafeSymbols,
    /// Alphanumeric plus all printable ASCII symbols
    AllSymbols,
}

impl Complexity {
    /// Map the ordinal 0..=2 to a complexity level
    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            0 => Some(Complexity::Alphanumeric),
            1 => Some(Complexity::SafeSymbols),
            2 => Some(Complexity::AllSymbols),
            _ => None,
        }
    }

    pub fn level(self) -> u8 {
        match self {
            Complexity::Alphanumeric => 0,
            Complexity::SafeSymbols => 1,
            Complexity::AllSymbols => 2,
        }
    }

    /// Symbols this level adds on top of the alphanumerics
    pub fn symbols(self) -> &'static str {
        match self {
            Complexity::Alphanumeric => "",
            Complexity::SafeSymbols => SAFE_SYMBOLS,
            Complexity::AllSymbols => ALL_SYMBOLS,
        }
    }
}

/// Parameters for a single generation call
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub length: usize,
    pub complexity: Complexity,
    /// Draw only from the symbols added by `complexity`
    pub complex_only: bool,
    /// Upper bound on generation time; `0` disables the bound
    pub timeout_seconds: f64,
}

impl GenerateRequest {
    /// Request used for salts: 16 alphanumeric characters
    pub fn salt(timeout_seconds: f64) -> Self {
        Self {
            length: crate::SALT_LENGTH,
            complexity: Complexity::Alphanumeric,
            complex_only: false,
            timeout_seconds,
        }
    }

    /// Instant after which generation must give up, if bounded.
    /// Timeouts too large to represent are unbounded.
    pub fn deadline(&self, start: Instant) -> Option<Instant> {
        if self.timeout_seconds > 0.0 {
            Duration::try_from_secs_f64(self.timeout_seconds)
                .ok()
                .and_then(|timeout| start.checked_add(timeout))
        } else {
            None
        }
    }
}

/// Generation failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerateError {
    #[error("generation exceeded {0} seconds")]
    TimedOut(f64),
}

/// Source of random password strings
pub trait RandomGenerator: Send + Sync {
    fn generate(&self, request: &GenerateRequest) -> Result<String, GenerateError>;
}

/// Default generator drawing from fixed character pools with `rand`
#[derive(Debug, Clone, Copy, Default)]
pub struct CharsetGenerator;

impl CharsetGenerator {
    pub fn new() -> Self {
        Self
    }
}

/// Build the character pool for a request
fn char_pool(complexity: Complexity, complex_only: bool) -> Vec<char> {
    let mut pool = String::new();

    // complex_only at level 0 adds no symbols, so it falls back to alphanumerics
    if !complex_only || complexity == Complexity::Alphanumeric {
        pool.push_str(LOWER_LETTERS);
        pool.push_str(UPPER_LETTERS);
        pool.push_str(DIGITS);
    }
    pool.push_str(complexity.symbols());

    pool.chars().collect()
}

/// Whether a candidate contains every character class the request requires
fn has_required_classes(candidate: &str, request: &GenerateRequest) -> bool {
    if request.complexity == Complexity::Alphanumeric || request.complex_only || request.length < 2 {
        return true;
    }
    let symbols = request.complexity.symbols();
    candidate.chars().any(|c| symbols.contains(c))
        && candidate.chars().any(|c| c.is_ascii_alphanumeric())
}

impl RandomGenerator for CharsetGenerator {
    fn generate(&self, request: &GenerateRequest) -> Result<String, GenerateError> {
        let start = Instant::now();
        let deadline = request.deadline(start);
        let chars = char_pool(request.complexity, request.complex_only);
        let mut rng = rand::rng();

        loop {
            let candidate: String = (0..request.length)
                .map(|_| chars[rng.random_range(0..chars.len())])
                .collect();

            if has_required_classes(&candidate, request) {
                return Ok(candidate);
            }

            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    return Err(GenerateError::TimedOut(request.timeout_seconds));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(length: usize, level: u8, complex_only: bool) -> GenerateRequest {
        GenerateRequest {
            length,
            complexity: Complexity::from_level(level).unwrap(),
            complex_only,
            timeout_seconds: 30.0,
        }
    }

    #[test]
    fn test_generate_default_is_alphanumeric() {
        let password = CharsetGenerator.generate(&request(32, 0, false)).unwrap();
        assert_eq!(password.len(), 32);
        assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_generate_salt_request() {
        let salt = CharsetGenerator.generate(&GenerateRequest::salt(30.0)).unwrap();
        assert_eq!(salt.len(), 16);
        assert!(salt.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_complex_only_at_level_zero_is_alphanumeric() {
        let password = CharsetGenerator.generate(&request(20, 0, true)).unwrap();
        assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_safe_symbols_required() {
        for _ in 0..20 {
            let password = CharsetGenerator.generate(&request(8, 1, false)).unwrap();
            assert!(password.chars().any(|c| SAFE_SYMBOLS.contains(c)));
            assert!(password.chars().any(|c| c.is_ascii_alphanumeric()));
        }
    }

    #[test]
    fn test_complexity_levels() {
        assert_eq!(Complexity::from_level(3), None);
        for level in 0..=2 {
            assert_eq!(Complexity::from_level(level).unwrap().level(), level);
        }
        assert_eq!(Complexity::default(), Complexity::Alphanumeric);
    }

    #[test]
    fn test_all_symbols_are_ascii_punctuation() {
        assert_eq!(ALL_SYMBOLS.len(), 32);
        assert!(ALL_SYMBOLS.chars().all(|c| c.is_ascii_punctuation()));
        assert!(SAFE_SYMBOLS.chars().all(|c| ALL_SYMBOLS.contains(c)));
    }

    #[test]
    fn test_deadline_unbounded_when_zero() {
        let mut req = request(8, 0, false);
        req.timeout_seconds = 0.0;
        assert!(req.deadline(Instant::now()).is_none());
        req.timeout_seconds = 1.5;
        assert!(req.deadline(Instant::now()).is_some());
    }

    #[test]
    fn test_huge_timeout_is_unbounded() {
        let mut req = request(8, 1, false);
        req.timeout_seconds = 1e20;
        assert!(req.deadline(Instant::now()).is_none());
        req.timeout_seconds = f64::MAX;
        assert!(req.deadline(Instant::now()).is_none());
        assert_eq!(CharsetGenerator.generate(&req).unwrap().len(), 8);
    }

    #[test]
    fn test_generate_uniqueness() {
        let p1 = CharsetGenerator.generate(&request(32, 0, false)).unwrap();
        let p2 = CharsetGenerator.generate(&request(32, 0, false)).unwrap();
        assert_ne!(p1, p2);
    }
}
