use crate::orm::{profiles, users};
use crate::session::{FlashLevel, FlashMessage};
use actix_session::Session;
use actix_web::dev::{
    self, Extensions, Payload, Service, ServiceRequest, ServiceResponse, Transform,
};
use actix_web::http::{header, Method};
use actix_web::{
    error::InternalError, web::Data, Error, FromRequest, HttpMessage, HttpRequest, HttpResponse,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use sea_orm::{DatabaseConnection, EntityTrait};
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Client data stored for a single request cycle.
/// Distinct from ClientCtx because it is defined through request data.
#[derive(Clone, Debug)]
pub struct ClientCtxInner {
    /// Account. None is a guest.
    pub user: Option<users::Model>,
    /// Public profile. Accounts may exist without one.
    pub profile: Option<profiles::Model>,
    /// Randomly generated string for CSP.
    pub nonce: String,
    /// CSRF token for form protection
    pub csrf_token: String,
    /// Flash messages popped for this page.
    pub flashes: Vec<FlashMessage>,
    /// Conversations holding a message the profile has not seen.
    pub unread_messages: u64,
    /// Path and query, for `?next=` after login.
    pub path: String,
    /// Time the request started for page load statistics.
    pub request_start: Instant,
}

impl Default for ClientCtxInner {
    fn default() -> Self {
        Self {
            user: None,
            profile: None,
            nonce: Self::nonce(),
            csrf_token: String::new(), // Will be populated from session
            flashes: Vec::new(),
            unread_messages: 0,
            path: "/".to_owned(),
            request_start: Instant::now(),
        }
    }
}

impl ClientCtxInner {
    pub async fn from_session(
        session: &Session,
        db: &DatabaseConnection,
        path: String,
        take_flashes: bool,
    ) -> Self {
        use crate::middleware::csrf::get_or_create_csrf_token;

        let user = match crate::session::get_user_id(session) {
            Some(id) => match users::Entity::find_by_id(id).one(db).await {
                Ok(user) => user,
                Err(err) => {
                    log::error!("Unable to load session user {}: {}", id, err);
                    None
                }
            },
            None => None,
        };

        let profile = match &user {
            Some(user) => crate::profiles::find_by_user(db, user.id)
                .await
                .unwrap_or_else(|err| {
                    log::error!("Unable to load profile for user {}: {}", user.id, err);
                    None
                }),
            None => None,
        };

        let unread_messages = match &profile {
            Some(profile) => crate::conversations::count_unseen(db, profile.id)
                .await
                .unwrap_or(0),
            None => 0,
        };

        // Get or create CSRF token for this session
        let csrf_token = get_or_create_csrf_token(session).unwrap_or_else(|_| String::new());

        let flashes = if take_flashes {
            crate::session::take_flashes(session)
        } else {
            Vec::new()
        };

        ClientCtxInner {
            user,
            profile,
            csrf_token,
            flashes,
            unread_messages,
            path,
            ..Default::default()
        }
    }

    /// Returns a hash unique to each request used for CSP.
    /// See: <https://developer.mozilla.org/en-US/docs/Web/HTML/Global_attributes/nonce>
    pub fn nonce() -> String {
        let mut hasher = blake3::Hasher::new();

        // Hash: Salt
        match std::env::var("SALT") {
            Ok(v) => hasher.update(v.as_bytes()),
            Err(_) => hasher.update("NO_SALT_FOR_NONCE".as_bytes()),
        };

        // Hash: Timestamp and some noise
        use std::time::{SystemTime, UNIX_EPOCH};
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        hasher.update(&millis.to_ne_bytes());
        hasher.update(&rand::random::<u64>().to_ne_bytes());
        hasher.finalize().to_string()
    }
}

/// Client context passed to routes.
/// Wraps ClientCtxInner, which is set at the beginning of the request.
#[derive(Clone, Debug)]
pub struct ClientCtx(Data<ClientCtxInner>);

impl Default for ClientCtx {
    fn default() -> Self {
        Self(Data::new(ClientCtxInner::default()))
    }
}

/// 302 to `location`, usable as an `Err` from any handler.
pub fn redirect_error(location: &str) -> Error {
    InternalError::from_response(
        format!("Redirecting to {}", location),
        HttpResponse::Found()
            .insert_header((header::LOCATION, location.to_owned()))
            .finish(),
    )
    .into()
}

/// `/accounts/login/?next=...`
pub fn login_url(next: &str) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    serializer.append_pair("next", next);
    format!("/accounts/login/?{}", serializer.finish())
}

impl ClientCtx {
    pub fn get_or_default_from_extensions(extensions: &mut Extensions) -> Self {
        match extensions.get::<Data<ClientCtxInner>>() {
            // Existing record in extensions; pull it and return clone.
            Some(cbox) => Self(cbox.clone()),
            // No existing record; create and insert it.
            None => {
                let cbox = Data::new(ClientCtxInner::default());
                extensions.insert(cbox.clone());
                Self(cbox)
            }
        }
    }

    pub fn get_profile_id(&self) -> Option<i32> {
        self.0.profile.as_ref().map(|p| p.id)
    }

    /// Display name, username when there is no profile, or the word for guest.
    pub fn get_name(&self) -> String {
        match (&self.0.profile, &self.0.user) {
            (Some(profile), _) => profile.display_name.to_owned(),
            (None, Some(user)) => user.username.to_owned(),
            (None, None) => crate::constants::GUEST_USERNAME.to_owned(),
        }
    }

    pub fn get_user(&self) -> Option<&users::Model> {
        self.0.user.as_ref()
    }

    pub fn get_profile(&self) -> Option<&profiles::Model> {
        self.0.profile.as_ref()
    }

    pub fn get_profile_url(&self) -> Option<String> {
        self.0.profile.as_ref().map(|p| p.get_url())
    }

    pub fn get_profile_picture_url(&self) -> Option<String> {
        self.0
            .profile
            .as_ref()
            .and_then(|p| p.profile_picture.as_deref())
            .map(crate::storage::media_url)
    }

    pub fn get_csrf_token(&self) -> &str {
        &self.0.csrf_token
    }

    pub fn get_unread_messages(&self) -> u64 {
        self.0.unread_messages
    }

    pub fn get_flashes(&self) -> &[FlashMessage] {
        &self.0.flashes
    }

    pub fn is_user(&self) -> bool {
        self.0.user.is_some()
    }

    pub fn has_profile(&self) -> bool {
        self.0.profile.is_some()
    }

    pub fn is_staff(&self) -> bool {
        self.0.user.as_ref().map_or(false, |u| u.is_staff)
    }

    /// True when `profile_id` is the viewer's own profile.
    pub fn owns(&self, profile_id: &i32) -> bool {
        self.get_profile_id() == Some(*profile_id)
    }

    pub fn get_nonce(&self) -> &String {
        &self.0.nonce
    }

    /// The profile's time zone, UTC for guests and unparseable names.
    pub fn timezone(&self) -> chrono_tz::Tz {
        self.0
            .profile
            .as_ref()
            .and_then(|p| p.timezone.parse::<chrono_tz::Tz>().ok())
            .unwrap_or(chrono_tz::UTC)
    }

    /// Formats a stored UTC timestamp in the viewer's time zone.
    pub fn format_datetime(&self, value: &chrono::NaiveDateTime) -> String {
        use chrono::TimeZone;
        self.timezone()
            .from_utc_datetime(value)
            .format("%b %-d, %Y, %-I:%M %p")
            .to_string()
    }

    pub fn format_date(&self, value: &chrono::NaiveDateTime) -> String {
        use chrono::TimeZone;
        self.timezone()
            .from_utc_datetime(value)
            .format("%b %-d, %Y")
            .to_string()
    }

    /// Current wall-clock time in the viewer's time zone.
    pub fn local_now(&self) -> chrono::NaiveDateTime {
        chrono::Utc::now()
            .with_timezone(&self.timezone())
            .naive_local()
    }

    /// Returns Duration representing request time.
    pub fn request_time(&self) -> Duration {
        Instant::now() - self.0.request_start
    }

    /// Returns human readable representing request time.
    pub fn request_time_as_string(&self) -> String {
        let us = self.request_time().as_micros();
        if us > 5000 {
            format!("{}ms", us / 1000)
        } else {
            format!("{}μs", us)
        }
    }

    /// Require user to be logged in. Guests are sent to the login page with
    /// a `next` back to this one.
    pub fn require_login(&self) -> Result<&users::Model, Error> {
        self.0
            .user
            .as_ref()
            .ok_or_else(|| redirect_error(&login_url(&self.0.path)))
    }

    /// Require a logged in user with a profile. Users without one are sent to
    /// profile creation with a flash explaining why.
    pub fn require_profile(&self, session: &Session) -> Result<&profiles::Model, Error> {
        self.require_login()?;
        match self.0.profile.as_ref() {
            Some(profile) => Ok(profile),
            None => {
                crate::session::push_flash(
                    session,
                    FlashLevel::Info,
                    crate::constants::PROFILE_REQUIRED_MESSAGE,
                );
                Err(redirect_error("/profiles/new/"))
            }
        }
    }

    /// Staff only. Guests go to login, everyone else gets 403.
    pub fn require_staff(&self) -> Result<&users::Model, Error> {
        let user = self.require_login()?;
        if !user.is_staff {
            return Err(actix_web::error::ErrorForbidden("Staff only"));
        }
        Ok(user)
    }
}

/// This implementation is what actually provides the `client: ClientCtx` in the parameters of route functions.
impl FromRequest for ClientCtx {
    /// The associated error which can be returned.
    type Error = Error;
    /// Future that resolves to a Self.
    type Future = Ready<Result<Self, Self::Error>>;

    /// Create a Self from request parts asynchronously.
    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Ok(ClientCtx::get_or_default_from_extensions(
            &mut req.extensions_mut(),
        )))
    }
}

impl<S: 'static, B> Transform<S, ServiceRequest> for ClientCtx
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = ClientCtxMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ClientCtxMiddleware {
            service: Rc::new(service),
        }))
    }
}

/// Client context middleware
pub struct ClientCtxMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for ClientCtxMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    dev::forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let svc = self.service.clone();

        // Borrows of `req` must be done in a precise way to avoid conflcits. This order is important.
        let (httpreq, payload) = req.into_parts();
        let session = Session::extract(&httpreq).into_inner();
        let path = httpreq
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str().to_owned())
            .unwrap_or_else(|| httpreq.path().to_owned());
        // Fragments and form posts never render the page flash area.
        let take_flashes =
            httpreq.method() == Method::GET && !crate::middleware::htmx::is_htmx(&httpreq);
        let req = ServiceRequest::from_parts(httpreq, payload);

        Box::pin(async move {
            let mut popped = Vec::new();
            let session = match session {
                Ok(session) => Some(session),
                Err(err) => {
                    log::error!("Unable to extract Session data in middleware: {}", err);
                    None
                }
            };

            // Without a database there is no client to look up.
            if let (Some(session), Some(db)) = (&session, req.app_data::<Data<DatabaseConnection>>()) {
                let inner = ClientCtxInner::from_session(session, db, path, take_flashes).await;
                popped = inner.flashes.clone();
                req.extensions_mut().insert(Data::new(inner));
            }

            let res = svc.call(req).await?;

            // A redirect never renders; keep the messages for the next page.
            if !popped.is_empty() && res.status().is_redirection() {
                if let Some(session) = &session {
                    crate::session::restore_flashes(session, popped);
                }
            }

            Ok(res)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_url_encodes_next() {
        assert_eq!(
            login_url("/ads/new/?x=1"),
            "/accounts/login/?next=%2Fads%2Fnew%2F%3Fx%3D1"
        );
    }

    #[test]
    fn test_guest_defaults() {
        let client = ClientCtx::default();
        assert!(!client.is_user());
        assert!(!client.is_staff());
        assert_eq!(client.get_name(), "Guest");
        assert_eq!(client.timezone(), chrono_tz::UTC);
        assert!(client.require_login().is_err());
    }

    #[test]
    fn test_nonce_differs() {
        assert_ne!(ClientCtxInner::nonce(), ClientCtxInner::nonce());
    }
}
