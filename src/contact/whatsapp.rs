/// WhatsApp contact deep-links (wa.me)
use crate::error::{FeiraError, Result};

const BRAZIL_COUNTRY_CODE: &str = "55";
const WA_ME_BASE: &str = "https://wa.me/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhatsAppLink {
    number: String,
    message: Option<String>,
}

impl WhatsAppLink {
    /// Accepts any punctuation. National numbers (DDD + 8/9 digits) get
    /// the Brazilian country code prepended.
    pub fn new(number: &str) -> Result<Self> {
        let digits: String = number.chars().filter(char::is_ascii_digit).collect();

        let normalized = match digits.len() {
            10 | 11 => format!("{}{}", BRAZIL_COUNTRY_CODE, digits),
            12 | 13 => digits,
            n => {
                return Err(FeiraError::InvalidParameter(format!(
                    "WhatsApp number '{}' has {} digits",
                    number, n
                )))
            }
        };

        Ok(WhatsAppLink {
            number: normalized,
            message: None,
        })
    }

    pub fn with_message(mut self, message: &str) -> Self {
        let trimmed = message.trim();
        self.message = (!trimmed.is_empty()).then(|| trimmed.to_string());
        self
    }

    pub fn number(&self) -> &str {
        &self.number
    }

    pub fn to_url(&self) -> String {
        match &self.message {
            Some(text) => format!("{}{}?text={}", WA_ME_BASE, self.number, urlencoding::encode(text)),
            None => format!("{}{}", WA_ME_BASE, self.number),
        }
    }
}

/// Prefilled message a visitor sends to a vendor from the catalog
pub fn vendor_inquiry(vendor: &str, product: Option<&str>) -> String {
    match product {
        Some(product) => format!(
            "Olá, {}! Vi o produto \"{}\" no site da Feira Livre de Buritizeiro e gostaria de mais informações.",
            vendor, product
        ),
        None => format!(
            "Olá, {}! Vi sua banca no site da Feira Livre de Buritizeiro e gostaria de mais informações.",
            vendor
        ),
    }
}
