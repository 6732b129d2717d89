//! Internal code generation.

/// Characters drawn from when generating internal codes.
pub const CODE_ALPHABET: &str = "INMOABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length of generated property codes.
pub const CODE_LENGTH: usize = 10;

/// Produces candidate internal codes.
pub trait CodeGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Uniform random codes over [`CODE_ALPHABET`].
#[derive(Debug, Clone, Copy)]
pub struct RandomCode {
    length: usize,
}

impl RandomCode {
    pub fn new(length: usize) -> Self {
        Self { length }
    }
}

impl Default for RandomCode {
    fn default() -> Self {
        Self::new(CODE_LENGTH)
    }
}

impl CodeGenerator for RandomCode {
    fn generate(&self) -> String {
        generate_code(self.length)
    }
}

/// Returns `length` characters picked uniformly from [`CODE_ALPHABET`].
pub fn generate_code(length: usize) -> String {
    let alphabet = CODE_ALPHABET.as_bytes();
    (0..length)
        .map(|_| alphabet[rand::random_range(0..alphabet.len())] as char)
        .collect()
}
