use itertools::Itertools;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{0} must be greater than 0")]
    NotPositive(&'static str),

    #[error("Used weight cannot exceed the start weight of {start} kg")]
    UsedWeightTooHigh { used: f64, start: f64 },

    #[error("Start weight '{0}' of the current roll is not a number")]
    InvalidStartWeight(String),

    #[error("Enter a count of at least 1 for flag reason '{0}'")]
    FlagCount(String),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct InputForm {
    pub material_number: String,
    pub batch: String,
    pub start_weight: f64,
    pub start_meter: f64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlagSelection {
    pub reason: String,
    pub count: i64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct OutputForm {
    pub final_meter: f64,
    pub core_weight: f64,
    pub flags: Vec<FlagSelection>,
}

fn required(value: &str, field: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Missing(field));
    }
    Ok(())
}

fn positive(value: f64, field: &'static str) -> Result<(), ValidationError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ValidationError::NotPositive(field));
    }
    Ok(())
}

pub fn validate_input(
    form: &InputForm,
    production_order: Option<&str>,
    machine_selected: bool,
    shift_selected: bool,
) -> Result<(), ValidationError> {
    required(production_order.unwrap_or_default(), "Production order")?;
    required(&form.material_number, "Material")?;
    required(&form.batch, "Batch")?;
    positive(form.start_weight, "Start weight")?;
    positive(form.start_meter, "Start meter")?;
    if !machine_selected {
        return Err(ValidationError::Missing("Machine"));
    }
    if !shift_selected {
        return Err(ValidationError::Missing("Shift"));
    }
    Ok(())
}

/// Consumed weight of an input roll: `0 < used <= start`.
pub fn validate_used_weight(used: f64, start: f64) -> Result<(), ValidationError> {
    positive(used, "Used weight")?;
    if used > start {
        return Err(ValidationError::UsedWeightTooHigh { used, start });
    }
    Ok(())
}

pub fn validate_output(form: &OutputForm) -> Result<(), ValidationError> {
    for flag in &form.flags {
        if flag.count < 1 {
            return Err(ValidationError::FlagCount(flag.reason.clone()));
        }
    }
    positive(form.final_meter, "Final meter")?;
    positive(form.core_weight, "Core weight")?;
    Ok(())
}

/// `"Wrinkles (2), Edge damage (1)"` plus the summed count.
pub fn encode_flags(flags: &[FlagSelection]) -> (Option<String>, i64) {
    if flags.is_empty() {
        return (None, 0);
    }
    let text = flags
        .iter()
        .map(|f| format!("{} ({})", f.reason, f.count))
        .join(", ");
    let count = flags.iter().map(|f| f.count).sum();
    (Some(text), count)
}

/// Weight text as the backend stores it: no trailing `.0` for whole numbers.
pub fn weight_text(value: f64) -> String {
    format!("{value}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> InputForm {
        InputForm {
            material_number: "M-1".to_string(),
            batch: "B123".to_string(),
            start_weight: 250.0,
            start_meter: 3000.0,
        }
    }

    #[test]
    fn used_weight_bounds() {
        assert!(validate_used_weight(0.0, 100.0).is_err());
        assert!(validate_used_weight(-5.0, 100.0).is_err());
        assert_eq!(
            validate_used_weight(100.5, 100.0),
            Err(ValidationError::UsedWeightTooHigh {
                used: 100.5,
                start: 100.0
            })
        );
        assert!(validate_used_weight(100.0, 100.0).is_ok());
        assert!(validate_used_weight(0.1, 100.0).is_ok());
        assert!(validate_used_weight(f64::NAN, 100.0).is_err());
    }

    #[test]
    fn input_requires_every_field() {
        assert!(validate_input(&input(), Some("PO1"), true, true).is_ok());
        assert_eq!(
            validate_input(&input(), None, true, true),
            Err(ValidationError::Missing("Production order"))
        );
        let mut form = input();
        form.batch = " ".to_string();
        assert_eq!(
            validate_input(&form, Some("PO1"), true, true),
            Err(ValidationError::Missing("Batch"))
        );
        let mut form = input();
        form.start_meter = 0.0;
        assert_eq!(
            validate_input(&form, Some("PO1"), true, true),
            Err(ValidationError::NotPositive("Start meter"))
        );
        assert_eq!(
            validate_input(&input(), Some("PO1"), false, true),
            Err(ValidationError::Missing("Machine"))
        );
        assert_eq!(
            validate_input(&input(), Some("PO1"), true, false),
            Err(ValidationError::Missing("Shift"))
        );
    }

    #[test]
    fn output_rejects_zero_count_flags() {
        let form = OutputForm {
            final_meter: 1200.0,
            core_weight: 1.2,
            flags: vec![FlagSelection {
                reason: "Wrinkles".to_string(),
                count: 0,
            }],
        };
        assert_eq!(
            validate_output(&form),
            Err(ValidationError::FlagCount("Wrinkles".to_string()))
        );
    }

    #[test]
    fn output_requires_meter_and_core_weight() {
        let mut form = OutputForm {
            final_meter: 0.0,
            core_weight: 1.0,
            flags: Vec::new(),
        };
        assert_eq!(
            validate_output(&form),
            Err(ValidationError::NotPositive("Final meter"))
        );
        form.final_meter = 10.0;
        form.core_weight = 0.0;
        assert_eq!(
            validate_output(&form),
            Err(ValidationError::NotPositive("Core weight"))
        );
    }

    #[test]
    fn flags_are_encoded_with_counts() {
        let (text, count) = encode_flags(&[
            FlagSelection {
                reason: "Wrinkles".to_string(),
                count: 2,
            },
            FlagSelection {
                reason: "Edge damage".to_string(),
                count: 1,
            },
        ]);
        assert_eq!(text.as_deref(), Some("Wrinkles (2), Edge damage (1)"));
        assert_eq!(count, 3);
        assert_eq!(encode_flags(&[]), (None, 0));
    }

    #[test]
    fn weight_text_drops_trailing_zero() {
        assert_eq!(weight_text(120.0), "120");
        assert_eq!(weight_text(12.5), "12.5");
    }
}
