use chrono::NaiveDate;

use crate::services::card_service::CardRequest;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid expiration date")]
    ExpiredCard,

    #[error("Invalid card number")]
    MalformedNumber,
}

/// Checks a registration candidate against the acceptance rules. Pure
/// function of the request and the supplied current date; rules run in
/// order and the first failure wins.
pub fn validate_card(request: &CardRequest, today: NaiveDate) -> Result<(), ValidationError> {
    // A card expiring today is still acceptable.
    if request.expiration_date < today {
        return Err(ValidationError::ExpiredCard);
    }

    if !is_card_number(&request.number) {
        return Err(ValidationError::MalformedNumber);
    }

    Ok(())
}

/// Exactly 13 to 19 ASCII digits, no separators.
fn is_card_number(number: &str) -> bool {
    (13..=19).contains(&number.len()) && number.bytes().all(|b| b.is_ascii_digit())
}
