/// Form validators: closure hook and declarative field rules
use crate::error::Result;
use crate::types::{FieldValue, FormErrors, FormValues};

/// Maps the values it is given to per-field messages. Fields missing
/// from the result are valid. `Err` signals a validator fault, not bad input.
pub trait Validator: Send + Sync {
    fn validate(&self, values: &FormValues) -> Result<FormErrors>;
}

impl<F> Validator for F
where
    F: Fn(&FormValues) -> Result<FormErrors> + Send + Sync,
{
    fn validate(&self, values: &FormValues) -> Result<FormErrors> {
        self(values)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldRule {
    Required,
    MinLength(usize),
    MaxLength(usize),
    Email,
    Phone,
    /// Checkbox must be ticked
    Checked,
}

impl FieldRule {
    /// Returns the user-facing message when `value` breaks the rule
    fn check(&self, value: &FieldValue) -> Option<String> {
        match self {
            FieldRule::Required => value.is_empty().then(|| "Campo obrigatório".to_string()),
            FieldRule::Checked => (value.as_bool() != Some(true))
                .then(|| "É necessário aceitar para continuar".to_string()),
            _ => {
                // Remaining rules only apply to filled-in text
                let text = value.as_text()?.trim();
                if text.is_empty() {
                    return None;
                }
                self.check_text(text)
            }
        }
    }

    fn check_text(&self, text: &str) -> Option<String> {
        match self {
            FieldRule::MinLength(min) => (text.chars().count() < *min)
                .then(|| format!("Mínimo de {} caracteres", min)),
            FieldRule::MaxLength(max) => (text.chars().count() > *max)
                .then(|| format!("Máximo de {} caracteres", max)),
            FieldRule::Email => (!is_valid_email(text)).then(|| "E-mail inválido".to_string()),
            FieldRule::Phone => (!is_valid_phone(text)).then(|| "Telefone inválido".to_string()),
            FieldRule::Required | FieldRule::Checked => None,
        }
    }
}

fn is_valid_email(text: &str) -> bool {
    if text.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = text.split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && domain.split('.').all(|label| !label.is_empty())
}

/// Brazilian numbers: 10-11 national digits, 12-13 with country code
fn is_valid_phone(text: &str) -> bool {
    let allowed = |c: char| c.is_ascii_digit() || " +-().".contains(c);
    if !text.chars().all(allowed) {
        return false;
    }

    let digits = text.chars().filter(char::is_ascii_digit).count();
    (10..=13).contains(&digits)
}

/// Ordered per-field rules; the first failing rule per field wins.
/// Fields absent from the validated map are skipped, so a single-field
/// map (blur) only checks that field.
#[derive(Debug, Clone, Default)]
pub struct RuleValidator {
    rules: Vec<(String, FieldRule)>,
}

impl RuleValidator {
    pub fn new() -> Self {
        RuleValidator::default()
    }

    pub fn rule(mut self, field: &str, rule: FieldRule) -> Self {
        self.rules.push((field.to_string(), rule));
        self
    }

    pub fn rules(&self) -> &[(String, FieldRule)] {
        &self.rules
    }
}

impl Validator for RuleValidator {
    fn validate(&self, values: &FormValues) -> Result<FormErrors> {
        let mut errors = FormErrors::new();

        for (field, rule) in &self.rules {
            if errors.contains_key(field) {
                continue;
            }

            let Some(value) = values.get(field) else {
                continue;
            };

            if let Some(message) = rule.check(value) {
                errors.insert(field.clone(), message);
            }
        }

        Ok(errors)
    }
}
