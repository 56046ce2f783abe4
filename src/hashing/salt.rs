use rand::RngCore;
use rand_core::OsRng;
use crate::utils::errors::WardenError;

/// 128 bits of entropy per salt.
pub const SALT_LENGTH: usize = 16;

///
/// Produces a fresh unpredictable salt for each password set.
///
/// Backed by the operating system's CSPRNG - never a seeded general-purpose
/// generator. Like the clock, the source can be fixed so tests get a known
/// salt.
///
#[derive(Debug, Default)]
pub struct SaltGenerator {
    fixed: Option<String>
}

impl SaltGenerator {
    ///
    /// A fresh salt, rendered url-safe base64 without padding. The rendered
    /// text is what gets stored and fed to the KDF.
    ///
    pub fn generate(&self) -> Result<String, WardenError> {
        if let Some(fixed) = &self.fixed {
            return Ok(fixed.clone())
        }

        let mut bytes = [0u8; SALT_LENGTH];
        OsRng.try_fill_bytes(&mut bytes)?;

        Ok(base64::encode_config(&bytes, base64::URL_SAFE_NO_PAD))
    }

    pub fn fix(&mut self, fixed: Option<String>) {
        self.fixed = fixed;
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_salts_are_fresh_every_time() -> Result<(), WardenError> {
        let generator = SaltGenerator::default();
        assert_ne!(generator.generate()?, generator.generate()?);
        Ok(())
    }

    #[test]
    fn test_a_salt_renders_128_bits_without_padding() -> Result<(), WardenError> {
        let salt = SaltGenerator::default().generate()?;

        // 16 bytes -> 22 base64 characters, no '=' padding, url-safe alphabet.
        assert_eq!(salt.len(), 22);
        assert!(salt.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_eq!(base64::decode_config(&salt, base64::URL_SAFE_NO_PAD).unwrap().len(), SALT_LENGTH);
        Ok(())
    }

    #[test]
    fn test_a_fixed_generator_repeats_until_released() -> Result<(), WardenError> {
        let mut generator = SaltGenerator::default();

        generator.fix(Some("AAAAAAAAAAAAAAAAAAAAAA".to_string()));
        assert_eq!(generator.generate()?, "AAAAAAAAAAAAAAAAAAAAAA");
        assert_eq!(generator.generate()?, generator.generate()?);

        generator.fix(None);
        assert_ne!(generator.generate()?, "AAAAAAAAAAAAAAAAAAAAAA");
        Ok(())
    }
}
