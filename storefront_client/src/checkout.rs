//! Client-side checkout validation.
//!
//! A fast-fail UX measure only: the same rules are enforced server-side, and the server remains the authority. A
//! form that fails here is rejected before any network request is made.

use storefront_payment_server::data_objects::CheckoutRequest;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutFormError {
    #[error("Your cart is empty")]
    EmptyCart,
    #[error("Invalid quantity for '{0}'")]
    BadQuantity(String),
    #[error("Please fill in the '{0}' field")]
    BlankField(&'static str),
}

pub fn validate_form(request: &CheckoutRequest) -> Result<(), CheckoutFormError> {
    if request.items.is_empty() {
        return Err(CheckoutFormError::EmptyCart);
    }
    if let Some(item) = request.items.iter().find(|i| i.quantity < 1) {
        return Err(CheckoutFormError::BadQuantity(item.product_name.clone()));
    }
    let addr = &request.shipping_address;
    let required = [
        ("name", addr.name.as_str()),
        ("phone", addr.phone.as_str()),
        ("address", addr.address.as_str()),
        ("province", addr.province.as_str()),
        ("district", addr.district.as_str()),
        ("ward", addr.ward.as_str()),
    ];
    if let Some((field, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
        return Err(CheckoutFormError::BlankField(field));
    }
    Ok(())
}
