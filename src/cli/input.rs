use anyhow::{Result, bail};

/// Parses a user-entered amount.
///
/// Accepts digits with at most one decimal point and rejects anything that is
/// not strictly positive.
pub fn parse_amount(input: &str) -> Result<f64> {
    let input = input.trim();
    let well_formed = !input.is_empty()
        && input != "."
        && input.chars().all(|c| c.is_ascii_digit() || c == '.')
        && input.matches('.').count() <= 1;
    if !well_formed {
        bail!("Invalid amount: '{}'", input);
    }

    let amount: f64 = input.parse()?;
    if amount <= 0.0 {
        bail!("Amount must be greater than zero");
    }
    Ok(amount)
}
