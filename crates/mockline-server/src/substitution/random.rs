//! Named random-data generators for `*RANDOM:NAME` overrides.
//!
//! The registry is an explicit value handed to the substitution engine, so
//! tests can swap in deterministic generators.

use super::specials::KNOWN_STATUS_CODES;
use super::SubstitutionError;
use fake::faker::address::en::{CityName, StateName, ZipCode};
use fake::faker::company::en::CompanyName;
use fake::faker::internet::en::{DomainSuffix, IPv4, IPv6, SafeEmail, Username};
use fake::faker::lorem::en::{Sentence, Word};
use fake::faker::name::en::{FirstName, LastName, Name};
use fake::faker::phone_number::en::PhoneNumber;
use fake::Fake;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeMap;
use std::sync::Arc;

pub type Generator = Arc<dyn Fn() -> String + Send + Sync>;

const COLORS: [&str; 12] = [
    "Red", "Green", "Blue", "Yellow", "Orange", "Purple", "Black", "White", "Gray", "Pink",
    "Brown", "Teal",
];

const LANGUAGES: [&str; 10] = [
    "English", "Spanish", "French", "German", "Hindi", "Mandarin", "Japanese", "Portuguese",
    "Arabic", "Italian",
];

const APP_PREFIXES: [&str; 8] = [
    "Quick", "Smart", "Cloud", "Pixel", "Hyper", "Bright", "Zen", "Nova",
];

const APP_SUFFIXES: [&str; 8] = ["Notes", "Pay", "Track", "Hub", "Chat", "Board", "Sync", "Ly"];

#[derive(Clone, Default)]
pub struct RandomRegistry {
    generators: BTreeMap<String, Generator>,
}

impl RandomRegistry {
    /// A registry with no generators.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The bundled generator set.
    pub fn standard() -> Self {
        Self::empty()
            .with("NAME", || Name().fake())
            .with("FIRSTNAME", || FirstName().fake())
            .with("LASTNAME", || LastName().fake())
            .with("USERNAME", || Username().fake())
            .with("EMAIL", || SafeEmail().fake())
            .with("DOMAIN", fake_domain)
            .with("URL", || format!("https://{}", fake_domain()))
            .with("IPV4", || IPv4().fake())
            .with("IPV6", || IPv6().fake())
            .with("HTTPSTATUSCODE", || {
                let code = KNOWN_STATUS_CODES
                    .choose(&mut rand::thread_rng())
                    .copied()
                    .unwrap_or(200);
                code.to_string()
            })
            .with("PHONE", || PhoneNumber().fake())
            .with("CITY", || CityName().fake())
            .with("STATE", || StateName().fake())
            .with("ZIP", || ZipCode().fake())
            .with("WORD", || Word().fake())
            .with("SENTENCE", || Sentence(4..10).fake())
            // Misspelt name still used by older definitions.
            .with("SETENCE", || Sentence(4..10).fake())
            .with("VISACARD", || luhn_number("4", 16))
            .with("MASTERCARD", || {
                let prefix = rand::thread_rng().gen_range(51..=55).to_string();
                luhn_number(&prefix, 16)
            })
            .with("CREDITCARD", || {
                if rand::thread_rng().gen_bool(0.5) {
                    luhn_number("4", 16)
                } else {
                    luhn_number("37", 15)
                }
            })
            .with("CARDCVV", || format!("{:03}", rand::thread_rng().gen_range(0..1000)))
            .with("CARDEXPIRY", || {
                let mut rng = rand::thread_rng();
                format!("{:02}/{:02}", rng.gen_range(1..=12), rng.gen_range(26..=35))
            })
            .with("BANKROUTING", aba_routing_number)
            .with("BANKACCOUNT", || digits(rand::thread_rng().gen_range(8..=12)))
            .with("COMPANYNAME", || CompanyName().fake())
            .with("APPNAME", || {
                let mut rng = rand::thread_rng();
                format!(
                    "{}{}",
                    APP_PREFIXES.choose(&mut rng).copied().unwrap_or("Quick"),
                    APP_SUFFIXES.choose(&mut rng).copied().unwrap_or("Hub")
                )
            })
            .with("COLOR", || {
                COLORS
                    .choose(&mut rand::thread_rng())
                    .copied()
                    .unwrap_or("Blue")
                    .to_string()
            })
            .with("LANGUAGE", || {
                LANGUAGES
                    .choose(&mut rand::thread_rng())
                    .copied()
                    .unwrap_or("English")
                    .to_string()
            })
            .with("NUMBER", || rand::thread_rng().gen_range(0..1_000_000).to_string())
    }

    /// Add or replace a generator. Names are case-insensitive.
    pub fn with<F>(mut self, name: &str, generator: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        self.generators
            .insert(name.trim().to_uppercase(), Arc::new(generator));
        self
    }

    pub fn generate(&self, name: &str) -> Result<String, SubstitutionError> {
        let key = name.trim().to_uppercase();
        self.generators
            .get(&key)
            .map(|g| g())
            .ok_or_else(|| SubstitutionError::UnknownGenerator(name.trim().to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.generators.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for RandomRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.generators.keys()).finish()
    }
}

fn fake_domain() -> String {
    let word: String = Word().fake();
    let suffix: String = DomainSuffix().fake();
    format!("{}.{}", word.to_lowercase(), suffix)
}

fn digits(count: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

/// A `length`-digit number starting with `prefix` whose last digit is the Luhn check digit.
pub(crate) fn luhn_number(prefix: &str, length: usize) -> String {
    let body_len = length.saturating_sub(1).max(prefix.len());
    let mut number = prefix.to_string();
    number.push_str(&digits(body_len - prefix.len()));
    let check = luhn_check_digit(&number);
    number.push(char::from(b'0' + check));
    number
}

fn luhn_check_digit(body: &str) -> u8 {
    let sum: u32 = body
        .bytes()
        .rev()
        .enumerate()
        .map(|(i, b)| {
            let d = u32::from(b - b'0');
            if i % 2 == 0 {
                let doubled = d * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                d
            }
        })
        .sum();
    ((10 - (sum % 10)) % 10) as u8
}

/// Nine digits with a valid ABA checksum.
fn aba_routing_number() -> String {
    let mut rng = rand::thread_rng();
    let mut d: Vec<u32> = (0..8).map(|_| rng.gen_range(0..10)).collect();
    d[0] = rng.gen_range(0..=1);
    let partial = 3 * (d[0] + d[3] + d[6]) + 7 * (d[1] + d[4] + d[7]) + (d[2] + d[5]);
    d.push((10 - partial % 10) % 10);
    d.iter().map(|n| n.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn luhn_valid(number: &str) -> bool {
        let sum: u32 = number
            .bytes()
            .rev()
            .enumerate()
            .map(|(i, b)| {
                let d = u32::from(b - b'0');
                if i % 2 == 1 {
                    let x = d * 2;
                    if x > 9 {
                        x - 9
                    } else {
                        x
                    }
                } else {
                    d
                }
            })
            .sum();
        sum % 10 == 0
    }

    #[test]
    fn test_standard_names_present() {
        let registry = RandomRegistry::standard();
        for name in [
            "NAME", "EMAIL", "IPV4", "VISACARD", "MASTERCARD", "BANKROUTING", "NUMBER",
        ] {
            assert!(!registry.generate(name).unwrap().is_empty(), "{name}");
        }
        assert!(registry.generate(" email ").is_ok());
    }

    #[test]
    fn test_legacy_sentence_spelling() {
        let registry = RandomRegistry::standard();
        let sentence = registry.generate("SETENCE").unwrap();
        assert!(sentence.split_whitespace().count() >= 4, "{sentence}");
    }

    #[test]
    fn test_unknown_generator() {
        let registry = RandomRegistry::standard();
        assert!(matches!(
            registry.generate("UNICORN"),
            Err(SubstitutionError::UnknownGenerator(name)) if name == "UNICORN"
        ));
    }

    #[test]
    fn test_card_numbers_pass_luhn() {
        let registry = RandomRegistry::standard();
        for _ in 0..50 {
            let visa = registry.generate("VISACARD").unwrap();
            assert_eq!(visa.len(), 16);
            assert!(visa.starts_with('4'));
            assert!(luhn_valid(&visa), "{visa}");

            let mc = registry.generate("MASTERCARD").unwrap();
            assert!(luhn_valid(&mc), "{mc}");

            let any = registry.generate("CREDITCARD").unwrap();
            assert!(luhn_valid(&any), "{any}");
        }
    }

    #[test]
    fn test_routing_number_checksum() {
        let registry = RandomRegistry::standard();
        for _ in 0..50 {
            let r: Vec<u32> = registry
                .generate("BANKROUTING")
                .unwrap()
                .chars()
                .map(|c| c.to_digit(10).unwrap())
                .collect();
            assert_eq!(r.len(), 9);
            let sum = 3 * (r[0] + r[3] + r[6]) + 7 * (r[1] + r[4] + r[7]) + (r[2] + r[5] + r[8]);
            assert_eq!(sum % 10, 0);
        }
    }

    #[test]
    fn test_custom_registry() {
        let registry = RandomRegistry::empty().with("fixed", || "same".to_string());
        assert_eq!(registry.generate("FIXED").unwrap(), "same");
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["FIXED"]);
    }
}
