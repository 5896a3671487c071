//! Registration flow.

use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use tracing::{error, info, instrument, warn};

use shopfront_core::{Email, EmailError, NewUser};

use super::{FlashMessage, Navigator, REGISTER_ERROR_DISPLAY, Route, SubmitOutcome};
use crate::error::Result;
use crate::services::{CartService, CategoryService, UserService};
use crate::store::Store;

/// Registration form fields, all required.
#[derive(Clone, Default)]
pub struct RegistrationForm {
    pub id_num: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub city: String,
    pub street: String,
    pub first_name: String,
    pub last_name: String,
}

/// A registration form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegistrationField {
    IdNum,
    Email,
    Password,
    ConfirmPassword,
    City,
    Street,
    FirstName,
    LastName,
}

impl RegistrationField {
    pub const ALL: [Self; 8] = [
        Self::IdNum,
        Self::Email,
        Self::Password,
        Self::ConfirmPassword,
        Self::City,
        Self::Street,
        Self::FirstName,
        Self::LastName,
    ];

    /// Name of the field in the request body.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::IdNum => "idNum",
            Self::Email => "email",
            Self::Password => "password",
            Self::ConfirmPassword => "confirmPassword",
            Self::City => "city",
            Self::Street => "street",
            Self::FirstName => "firstName",
            Self::LastName => "lastName",
        }
    }
}

/// Why a field is invalid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("This field is required")]
    Required,

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),
}

impl RegistrationForm {
    fn value(&self, field: RegistrationField) -> &str {
        match field {
            RegistrationField::IdNum => &self.id_num,
            RegistrationField::Email => &self.email,
            RegistrationField::Password => &self.password,
            RegistrationField::ConfirmPassword => &self.confirm_password,
            RegistrationField::City => &self.city,
            RegistrationField::Street => &self.street,
            RegistrationField::FirstName => &self.first_name,
            RegistrationField::LastName => &self.last_name,
        }
    }

    /// Validation error for one field, if any.
    #[must_use]
    pub fn field_error(&self, field: RegistrationField) -> Option<FieldError> {
        let value = self.value(field);
        if value.trim().is_empty() {
            return Some(FieldError::Required);
        }
        if field == RegistrationField::Email {
            return Email::parse(value.trim()).err().map(FieldError::from);
        }
        None
    }

    /// Every invalid field with its error, in form order.
    #[must_use]
    pub fn invalid_fields(&self) -> Vec<(RegistrationField, FieldError)> {
        RegistrationField::ALL
            .into_iter()
            .filter_map(|field| self.field_error(field).map(|e| (field, e)))
            .collect()
    }

    #[must_use]
    pub fn passwords_match(&self) -> bool {
        self.password == self.confirm_password
    }

    /// Whether the form can be submitted.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.passwords_match() && self.invalid_fields().is_empty()
    }

    /// Request body for the register endpoint.
    #[must_use]
    pub fn to_request(&self) -> NewUser {
        NewUser {
            id_num: self.id_num.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password.clone(),
            confirm_password: self.confirm_password.clone(),
            city: self.city.clone(),
            street: self.street.trim().to_string(),
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
        }
    }
}

impl std::fmt::Debug for RegistrationForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrationForm")
            .field("id_num", &self.id_num)
            .field("email", &self.email)
            .field("city", &self.city)
            .field("street", &self.street)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .finish_non_exhaustive()
    }
}

/// The registration page.
pub struct RegisterFlow {
    users: UserService,
    carts: CartService,
    categories: CategoryService,
    store: Arc<Store>,
    navigator: Arc<dyn Navigator>,
    flash: FlashMessage,
    error_display: Duration,
    cities: Vec<String>,
    pub form: RegistrationForm,
}

impl RegisterFlow {
    #[must_use]
    pub fn new(
        users: UserService,
        carts: CartService,
        categories: CategoryService,
        store: Arc<Store>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            users,
            carts,
            categories,
            store,
            navigator,
            flash: FlashMessage::new(),
            error_display: REGISTER_ERROR_DISPLAY,
            cities: Vec::new(),
            form: RegistrationForm::default(),
        }
    }

    /// Override how long a rejected registration message stays visible.
    #[must_use]
    pub const fn with_error_display(mut self, ttl: Duration) -> Self {
        self.error_display = ttl;
        self
    }

    /// Load the selectable cities from the store.
    pub fn init(&mut self) {
        self.cities = self.store.select(|state| state.cities.clone());
    }

    /// Cities offered in the city picker.
    #[must_use]
    pub fn cities(&self) -> &[String] {
        &self.cities
    }

    /// Inline message shown after a rejected registration.
    #[must_use]
    pub const fn message(&self) -> &FlashMessage {
        &self.flash
    }

    #[must_use]
    pub fn is_submit_disabled(&self) -> bool {
        !self.form.is_valid()
    }

    /// Submit the form.
    ///
    /// Registers, then loads the new user, their cart and the categories,
    /// and goes home. A disabled form is not sent.
    #[instrument(skip(self), fields(email = %self.form.email))]
    pub async fn submit(&self) -> SubmitOutcome {
        if self.is_submit_disabled() {
            warn!(
                invalid = self.form.invalid_fields().len(),
                passwords_match = self.form.passwords_match(),
                "Registration submitted while disabled"
            );
            return SubmitOutcome::Stayed;
        }

        match self.sign_up().await {
            Ok(()) => {
                self.navigator.navigate(Route::Home);
                SubmitOutcome::Navigated(Route::Home)
            }
            Err(e) if e.status() == Some(StatusCode::BAD_REQUEST) => {
                let message = e.server_message().unwrap_or_default().to_string();
                info!(message = %message, "Registration rejected");
                self.flash.show(message.clone(), self.error_display);
                SubmitOutcome::Rejected(message)
            }
            Err(e) => {
                error!(error = %e, "Registration failed");
                self.navigator.navigate(Route::Error);
                SubmitOutcome::Navigated(Route::Error)
            }
        }
    }

    async fn sign_up(&self) -> Result<()> {
        let token = self.users.register(&self.form.to_request()).await?;
        self.users.fetch_user_details(&token).await?;
        self.carts.fetch_cart_details(&token).await?;
        self.categories.fetch_categories(&token).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::api::Endpoint;
    use crate::api::fake::FakeApi;
    use crate::cache::{CartCache, MemoryStorage};
    use crate::flows::RecordingNavigator;
    use crate::store::Action;

    fn filled() -> RegistrationForm {
        RegistrationForm {
            id_num: "987654321".to_string(),
            email: "new@shop.test".to_string(),
            password: "pw1234".to_string(),
            confirm_password: "pw1234".to_string(),
            city: "Haifa".to_string(),
            street: "Hanassi 5".to_string(),
            first_name: "Noa".to_string(),
            last_name: "Cohen".to_string(),
        }
    }

    struct Harness {
        api: Arc<FakeApi>,
        store: Arc<Store>,
        nav: Arc<RecordingNavigator>,
        flow: RegisterFlow,
    }

    fn harness(api: FakeApi) -> Harness {
        let api = Arc::new(api);
        let store = Arc::new(Store::new());
        let cache = CartCache::new(Arc::new(MemoryStorage::new()));
        let carts = CartService::new(api.clone(), store.clone(), cache);
        let users = UserService::new(api.clone(), store.clone(), carts.clone());
        let categories = CategoryService::new(api.clone(), store.clone());
        let nav = Arc::new(RecordingNavigator::new());
        let mut flow = RegisterFlow::new(users, carts, categories, store.clone(), nav.clone());
        flow.form = filled();
        Harness {
            api,
            store,
            nav,
            flow,
        }
    }

    #[test]
    fn test_complete_form_is_valid() {
        assert!(filled().is_valid());
        assert!(filled().invalid_fields().is_empty());
    }

    #[test]
    fn test_blank_fields_are_required() {
        let mut form = filled();
        form.street = "   ".to_string();
        form.last_name.clear();

        assert_eq!(
            form.invalid_fields(),
            [
                (RegistrationField::Street, FieldError::Required),
                (RegistrationField::LastName, FieldError::Required),
            ]
        );
    }

    #[test]
    fn test_malformed_email_is_flagged() {
        let mut form = filled();
        form.email = "not-an-email".to_string();
        assert_eq!(
            form.field_error(RegistrationField::Email),
            Some(FieldError::InvalidEmail(EmailError::MissingAtSymbol))
        );
        assert!(!form.is_valid());
    }

    #[test]
    fn test_request_body_uses_form_values() {
        let body = filled().to_request();
        assert_eq!(body.email, "new@shop.test");
        assert_eq!(body.confirm_password, "pw1234");
        assert_eq!(RegistrationField::IdNum.name(), "idNum");
    }

    #[test]
    fn test_init_loads_cities_from_store() {
        let mut h = harness(FakeApi::new());
        h.store.dispatch(Action::SetCities(vec![
            "Haifa".to_string(),
            "Eilat".to_string(),
        ]));

        assert!(h.flow.cities().is_empty());
        h.flow.init();
        assert_eq!(h.flow.cities(), ["Haifa", "Eilat"]);
    }

    #[tokio::test]
    async fn test_password_mismatch_disables_submit() {
        let mut h = harness(FakeApi::new());
        h.flow.form.confirm_password = "other".to_string();

        assert!(h.flow.is_submit_disabled());
        assert_eq!(h.flow.submit().await, SubmitOutcome::Stayed);
        assert!(h.api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_successful_registration_goes_home() {
        let h = harness(FakeApi::new());

        let outcome = h.flow.submit().await;

        assert_eq!(outcome, SubmitOutcome::Navigated(Route::Home));
        assert_eq!(
            h.api.calls(),
            [
                Endpoint::Register,
                Endpoint::UserDetails,
                Endpoint::CurrentCart,
                Endpoint::Categories
            ]
        );
        let state = h.store.snapshot();
        assert!(state.jwt.is_some());
        assert_eq!(state.user_details.unwrap().email, "new@shop.test");
        assert_eq!(state.categories.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bad_request_flashes_for_three_seconds() {
        let mut h = harness(FakeApi::new());
        h.flow.form.email = "customer@shop.test".to_string();

        let outcome = h.flow.submit().await;

        assert_eq!(
            outcome,
            SubmitOutcome::Rejected("Email already registered".to_string())
        );
        assert!(h.nav.routes().is_empty());
        assert!(h.flow.message().current().is_some());

        tokio::time::sleep(REGISTER_ERROR_DISPLAY + Duration::from_millis(1)).await;
        assert_eq!(h.flow.message().current(), None);
    }

    #[tokio::test]
    async fn test_later_failure_short_circuits_to_error() {
        let h = harness(FakeApi::new());
        h.api.fail(
            Endpoint::CurrentCart,
            StatusCode::INTERNAL_SERVER_ERROR,
            "boom",
        );

        let outcome = h.flow.submit().await;

        assert_eq!(outcome, SubmitOutcome::Navigated(Route::Error));
        assert_eq!(
            h.api.calls(),
            [
                Endpoint::Register,
                Endpoint::UserDetails,
                Endpoint::CurrentCart
            ]
        );
        assert_eq!(h.nav.routes(), [Route::Error]);
    }
}
