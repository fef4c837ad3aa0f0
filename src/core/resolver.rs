use crate::domain::model::{ConfigurationField, ConfigurationRequest};
use crate::domain::ports::Prompt;
use crate::utils::error::{OrderError, Result};

/// Invalid answers tolerated per field before giving up.
pub const MAX_INPUT_RETRIES: usize = 3;

/// Settles the required configuration fields of a cart item.
pub struct ConfigurationResolver<'a, P: Prompt + ?Sized> {
    prompt: &'a mut P,
}

impl<'a, P: Prompt + ?Sized> ConfigurationResolver<'a, P> {
    pub fn new(prompt: &'a mut P) -> Self {
        Self { prompt }
    }

    /// Returns the requests still needed to satisfy every required field.
    ///
    /// Labels already in `known` are never touched. A field with a single
    /// allowed value is filled in directly; any other is asked through the
    /// prompt.
    pub async fn resolve(
        &mut self,
        fields: &[ConfigurationField],
        known: &[ConfigurationRequest],
    ) -> Result<Vec<ConfigurationRequest>> {
        let mut resolved: Vec<ConfigurationRequest> = Vec::new();

        for field in fields.iter().filter(|f| f.required) {
            let already_set = known
                .iter()
                .chain(resolved.iter())
                .any(|c| c.label == field.label);
            if already_set {
                continue;
            }

            match field.allowed_values.as_slice() {
                [] => {
                    tracing::warn!(
                        "Required field '{}' lists no allowed values, skipping",
                        field.label
                    );
                }
                [only] => {
                    tracing::debug!("Auto configuration {}={}", field.label, only);
                    resolved.push(ConfigurationRequest::new(&field.label, only));
                }
                _ => {
                    let value = self.ask(field).await?;
                    tracing::info!("Manual configuration {}={}", field.label, value);
                    resolved.push(ConfigurationRequest::new(&field.label, value));
                }
            }
        }

        Ok(resolved)
    }

    async fn ask(&mut self, field: &ConfigurationField) -> Result<String> {
        let mut last_reason = String::new();

        for attempt in 0..MAX_INPUT_RETRIES {
            let answer = self.prompt.ask(field, attempt).await?;
            match parse_choice(&answer, field.allowed_values.len()) {
                Ok(index) => return Ok(field.allowed_values[index].clone()),
                Err(reason) => {
                    tracing::warn!("Rejected choice for {}: {}", field.label, reason);
                    self.prompt.reject(&reason).await?;
                    last_reason = reason;
                }
            }
        }

        Err(OrderError::InputError {
            label: field.label.clone(),
            message: format!("too many invalid choices, last one: {}", last_reason),
        })
    }
}

fn parse_choice(answer: &str, choices: usize) -> std::result::Result<usize, String> {
    let answer = answer.trim();
    let index: usize = answer
        .parse()
        .map_err(|_| format!("'{}' is not a number", answer))?;

    if index >= choices {
        return Err(format!("{} is out of range 0..{}", index, choices - 1));
    }
    Ok(index)
}
