use axum::{extract::FromRequestParts, http::request::Parts, response::Redirect};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tracing::{info, warn};

use crate::{
    catalog::CatalogService,
    error::{AppError, AppResult, CatalogError, Field, ValidationErrors},
    models::{AccessToken, Session, SignInRequest},
    notify::Navigation,
};

pub const EMAIL_REQUIRED: &str = "Email is required";
pub const PASSWORD_REQUIRED: &str = "Password is required";
pub const EMAIL_INVALID: &str = "Please enter a valid email address";

const SESSION_COOKIE: &str = "session";

#[derive(Clone, Debug, Default)]
pub struct SignInForm {
    pub email: String,
    pub password: String,
}

impl From<SignInRequest> for SignInForm {
    fn from(req: SignInRequest) -> Self {
        Self { email: req.email.trim().to_string(), password: req.password }
    }
}

impl SignInForm {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if self.email.is_empty() {
            errors.push(Field::Email, EMAIL_REQUIRED);
        }
        if self.password.is_empty() {
            errors.push(Field::Password, PASSWORD_REQUIRED);
        }
        if !self.email.is_empty() && !is_valid_email(&self.email) {
            errors.push(Field::Email, EMAIL_INVALID);
        }
        errors.into_result()
    }
}

/// `local@domain.tld`: no whitespace, a single `@`, and a dot inside the domain.
fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.char_indices().any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

pub async fn sign_in(catalog: &dyn CatalogService, form: &SignInForm) -> AppResult<Session> {
    form.validate().map_err(AppError::Validation)?;

    match catalog.sign_in(&form.email, &form.password).await {
        Ok(session) => {
            info!(email = %form.email, user = ?session.user_email, "signed in");
            Ok(session)
        },
        Err(CatalogError::Rejected { message, .. }) => {
            warn!(email = %form.email, message = %message, "sign-in rejected");
            Err(AppError::Auth(message))
        },
        Err(err) => {
            warn!(email = %form.email, error = %err, "sign-in failed");
            Err(err.into())
        },
    }
}

pub fn start_session(jar: CookieJar, session: &Session, secure: bool) -> CookieJar {
    let cookie = Cookie::build((SESSION_COOKIE, session.access_token.as_str().to_string()))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(session.expires_in.max(60)));
    jar.add(cookie)
}

pub fn end_session(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
}

pub fn session_token(jar: &CookieJar) -> Option<AccessToken> {
    jar.get(SESSION_COOKIE)
        .map(|c| c.value().trim().to_string())
        .filter(|v| !v.is_empty())
        .map(AccessToken::new)
}

/// Access token of the signed-in user. Requests without one are sent to sign-in.
#[derive(Clone, Debug)]
pub struct SessionToken(pub AccessToken);

impl<S> FromRequestParts<S> for SessionToken
where
    S: Send + Sync,
{
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        session_token(&CookieJar::from_headers(&parts.headers))
            .map(SessionToken)
            .ok_or_else(|| Navigation::SignIn.redirect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, FakeCatalog};

    fn form(email: &str, password: &str) -> SignInForm {
        SignInForm { email: email.to_string(), password: password.to_string() }
    }

    #[test]
    fn email_shapes() {
        for ok in ["a@b.co", "first.last@mail.example.org", "x+tag@d.io"] {
            assert!(is_valid_email(ok), "{ok}");
        }
        for bad in ["plain", "@b.co", "a@", "a@b", "a@.co", "a@b.", "a b@c.de", "a@b@c.de"] {
            assert!(!is_valid_email(bad), "{bad}");
        }
    }

    #[test]
    fn empty_form_reports_both_fields() {
        let errors = form("", "").validate().unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.for_field(Field::Email), Some(EMAIL_REQUIRED));
        assert_eq!(errors.for_field(Field::Password), Some(PASSWORD_REQUIRED));
    }

    #[tokio::test]
    async fn malformed_email_never_reaches_the_service() {
        let fake = FakeCatalog::default();

        let err = sign_in(&fake, &form("not-an-email", "secret")).await.unwrap_err();

        let AppError::Validation(errors) = err else {
            panic!("expected validation failure");
        };
        assert_eq!(errors.for_field(Field::Email), Some(EMAIL_INVALID));
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn rejected_credentials_surface_the_service_message() {
        let fake = FakeCatalog { reject_sign_in: true, ..Default::default() };

        let err = sign_in(&fake, &form("a@b.co", "wrong")).await.unwrap_err();

        assert!(matches!(err, AppError::Auth(ref m) if m == "Invalid login credentials"));
        assert_eq!(fake.calls(), vec![Call::SignIn { email: "a@b.co".to_string() }]);
    }

    #[tokio::test]
    async fn accepted_credentials_yield_a_session() {
        let fake = FakeCatalog::default();

        let session = sign_in(&fake, &form("a@b.co", "right")).await.unwrap();

        assert_eq!(session.access_token.as_str(), "token-123");
        let jar = start_session(CookieJar::new(), &session, false);
        assert_eq!(session_token(&jar), Some(AccessToken::new("token-123")));
        assert_eq!(session_token(&end_session(jar)), None);
    }
}
