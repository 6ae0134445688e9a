use crate::{
    config::Config,
    error::{CampusPayError, Result},
    models::{
        LoginRequest, LoginResponse, RegisterRequest, Role, SetMpinRequest, User, UserProfile,
    },
    services::{CacheService, Store},
};
use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::sync::Arc;
use std::time::Duration;
use subtle::ConstantTimeEq;
use uuid::Uuid;

const HASH_SCHEME: &str = "pbkdf2-sha256";
const SALT_SIZE: usize = 16;
const KEY_SIZE: usize = 32;
const MIN_PASSWORD_LEN: usize = 8;
const MAX_NAME_LEN: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

pub struct AuthService {
    store: Arc<Store>,
    cache: Arc<CacheService>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    jwt_ttl: Duration,
    iterations: u32,
    mpin_max_attempts: u32,
    mpin_lockout: Duration,
}

impl AuthService {
    pub fn new(config: &Config, store: Arc<Store>, cache: Arc<CacheService>) -> Self {
        Self {
            store,
            cache,
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            jwt_ttl: config.jwt_ttl,
            iterations: config.password_iterations,
            mpin_max_attempts: config.mpin_max_attempts,
            mpin_lockout: config.mpin_lockout,
        }
    }

    pub async fn register(&self, req: RegisterRequest) -> Result<UserProfile> {
        if !matches!(req.role, Role::Student | Role::Vendor) {
            return Err(CampusPayError::Forbidden(format!(
                "{} accounts cannot self-register",
                req.role
            )));
        }

        let user = self
            .create_user(req.name, req.email, req.phone, req.role, req.password)
            .await?;
        Ok(UserProfile::from(&user))
    }

    /// Validates and inserts a new account. Email uniqueness is checked
    /// under the write lock.
    pub async fn create_user(
        &self,
        name: String,
        email: String,
        phone: Option<String>,
        role: Role,
        password: String,
    ) -> Result<User> {
        let name = name.trim().to_string();
        if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
            return Err(CampusPayError::Validation(format!(
                "name must be 1-{} characters",
                MAX_NAME_LEN
            )));
        }
        let email = normalize_email(&email)?;
        let phone = phone.map(|p| p.trim().to_string()).filter(|p| !p.is_empty());
        if let Some(phone) = &phone {
            validate_phone(phone)?;
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(CampusPayError::Validation(format!(
                "password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        let password_hash = self.hash_secret(password).await?;
        let user = User::new(name, email, phone, role, password_hash);

        let inserted = self
            .store
            .write(|db| {
                if db.user_by_email(&user.email).is_some() {
                    return Err(CampusPayError::Conflict(format!(
                        "email already registered: {}",
                        user.email
                    )));
                }
                db.users.insert(user.id, user.clone());
                Ok(user)
            })
            .await?;

        tracing::info!(user_id = %inserted.id, role = %inserted.role, "Account created");
        Ok(inserted)
    }

    pub async fn login(&self, req: LoginRequest) -> Result<LoginResponse> {
        let email = req.email.trim().to_lowercase();
        let user = self
            .store
            .read(|db| db.user_by_email(&email).cloned())
            .await
            .ok_or_else(|| CampusPayError::Unauthorized("invalid email or password".to_string()))?;

        if !self.verify_secret(req.password, user.password_hash.clone()).await? {
            tracing::warn!(user_id = %user.id, "Failed login attempt");
            return Err(CampusPayError::Unauthorized(
                "invalid email or password".to_string(),
            ));
        }

        if user.is_suspended {
            tracing::warn!(user_id = %user.id, "Suspended account attempted login");
            return Err(CampusPayError::AccountSuspended);
        }

        let (token, expires_at) = self.issue_token(&user)?;
        tracing::info!(user_id = %user.id, role = %user.role, "Login succeeded");

        Ok(LoginResponse {
            token,
            expires_at,
            user: UserProfile::from(&user),
        })
    }

    pub fn issue_token(&self, user: &User) -> Result<(String, DateTime<Utc>)> {
        let now = Utc::now();
        let ttl = ChronoDuration::from_std(self.jwt_ttl)
            .map_err(|e| CampusPayError::InternalError(format!("invalid JWT TTL: {}", e)))?;
        let expires_at = now + ttl;

        let claims = Claims {
            sub: user.id,
            role: user.role,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| CampusPayError::InternalError(format!("token encoding failed: {}", e)))?;
        Ok((token, expires_at))
    }

    pub fn decode_token(&self, token: &str) -> Result<Claims> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| CampusPayError::Unauthorized(format!("invalid token: {}", e)))
    }

    pub async fn profile(&self, user_id: Uuid) -> Result<UserProfile> {
        self.store
            .read(|db| db.users.get(&user_id).map(UserProfile::from))
            .await
            .ok_or_else(|| CampusPayError::NotFound(format!("user {}", user_id)))
    }

    pub async fn set_mpin(&self, user_id: Uuid, req: SetMpinRequest) -> Result<()> {
        validate_mpin_format(&req.mpin)?;

        let password_hash = self
            .store
            .read(|db| db.users.get(&user_id).map(|u| u.password_hash.clone()))
            .await
            .ok_or_else(|| CampusPayError::NotFound(format!("user {}", user_id)))?;

        if !self.verify_secret(req.password, password_hash).await? {
            return Err(CampusPayError::Unauthorized("password is incorrect".to_string()));
        }

        let mpin_hash = self.hash_secret(req.mpin).await?;
        self.store
            .write(|db| {
                let user = db
                    .users
                    .get_mut(&user_id)
                    .ok_or_else(|| CampusPayError::NotFound(format!("user {}", user_id)))?;
                user.mpin_hash = Some(mpin_hash);
                user.touch();
                Ok::<_, CampusPayError>(())
            })
            .await?;

        self.cache
            .reset(&mpin_failure_key(user_id))
            .await
            .map_err(|e| CampusPayError::CacheError(e.to_string()))?;

        tracing::info!(user_id = %user_id, "MPIN updated");
        Ok(())
    }

    /// Checks a payment MPIN, counting attempts toward a temporary lockout.
    ///
    /// The attempt is counted before the hash is compared, so concurrent
    /// guesses each see a distinct count and at most `mpin_max_attempts`
    /// of them are ever checked within one window.
    pub async fn verify_mpin(&self, user_id: Uuid, mpin: &str) -> Result<()> {
        validate_mpin_format(mpin)?;

        let mpin_hash = self
            .store
            .read(|db| db.users.get(&user_id).map(|u| u.mpin_hash.clone()))
            .await
            .ok_or_else(|| CampusPayError::NotFound(format!("user {}", user_id)))?
            .ok_or(CampusPayError::MpinNotSet)?;

        let key = mpin_failure_key(user_id);
        let max = i64::from(self.mpin_max_attempts);
        let attempt = self
            .cache
            .increment(&key, 1, self.mpin_lockout)
            .await
            .map_err(|e| CampusPayError::CacheError(e.to_string()))?;
        if attempt > max {
            return Err(CampusPayError::MpinLocked);
        }

        if self.verify_secret(mpin.to_string(), mpin_hash).await? {
            self.cache
                .reset(&key)
                .await
                .map_err(|e| CampusPayError::CacheError(e.to_string()))?;
            return Ok(());
        }

        if attempt >= max {
            tracing::warn!(user_id = %user_id, attempts = attempt, "MPIN locked");
            return Err(CampusPayError::MpinLocked);
        }

        Err(CampusPayError::InvalidMpin {
            remaining: (max - attempt) as u32,
        })
    }

    /// Creates the configured administrator unless that email already exists.
    pub async fn bootstrap_admin(&self, email: &str, password: &str) -> Result<bool> {
        let exists = self
            .store
            .read(|db| db.user_by_email(email.trim()).is_some())
            .await;
        if exists {
            return Ok(false);
        }

        self.create_user(
            "Administrator".to_string(),
            email.to_string(),
            None,
            Role::Admin,
            password.to_string(),
        )
        .await?;
        Ok(true)
    }

    pub async fn hash_secret(&self, secret: String) -> Result<String> {
        let iterations = self.iterations;
        tokio::task::spawn_blocking(move || hash_secret(&secret, iterations))
            .await
            .map_err(|e| CampusPayError::InternalError(format!("hashing task failed: {}", e)))
    }

    pub async fn verify_secret(&self, secret: String, encoded: String) -> Result<bool> {
        tokio::task::spawn_blocking(move || verify_secret(&secret, &encoded))
            .await
            .map_err(|e| CampusPayError::InternalError(format!("hashing task failed: {}", e)))
    }
}

fn mpin_failure_key(user_id: Uuid) -> String {
    format!("mpin:fail:{}", user_id)
}

pub fn hash_secret(secret: &str, iterations: u32) -> String {
    let mut salt = [0u8; SALT_SIZE];
    rand::thread_rng().fill_bytes(&mut salt);

    let mut key = [0u8; KEY_SIZE];
    pbkdf2::pbkdf2_hmac::<Sha256>(secret.as_bytes(), &salt, iterations, &mut key);

    format!(
        "{}${}${}${}",
        HASH_SCHEME,
        iterations,
        STANDARD_NO_PAD.encode(salt),
        STANDARD_NO_PAD.encode(key)
    )
}

/// Malformed hashes verify as false.
pub fn verify_secret(secret: &str, encoded: &str) -> bool {
    let mut parts = encoded.split('$');
    let (Some(scheme), Some(iterations), Some(salt), Some(expected), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return false;
    };
    if scheme != HASH_SCHEME {
        return false;
    }
    let Ok(iterations) = iterations.parse::<u32>() else {
        return false;
    };
    let (Ok(salt), Ok(expected)) = (
        STANDARD_NO_PAD.decode(salt),
        STANDARD_NO_PAD.decode(expected),
    ) else {
        return false;
    };
    if expected.is_empty() {
        return false;
    }

    let mut key = vec![0u8; expected.len()];
    pbkdf2::pbkdf2_hmac::<Sha256>(secret.as_bytes(), &salt, iterations, &mut key);
    key.ct_eq(&expected).into()
}

fn normalize_email(email: &str) -> Result<String> {
    let email = email.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err(CampusPayError::Validation(format!("invalid email: {}", email)));
    }
    Ok(email)
}

fn validate_phone(phone: &str) -> Result<()> {
    let digits = phone.strip_prefix('+').unwrap_or(phone);
    if !(10..=15).contains(&digits.len()) || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CampusPayError::Validation(format!("invalid phone number: {}", phone)));
    }
    Ok(())
}

fn validate_mpin_format(mpin: &str) -> Result<()> {
    if mpin.len() != 6 || !mpin.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CampusPayError::Validation(
            "MPIN must be exactly 6 digits".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    fn service() -> AuthService {
        service_with(Config {
            password_iterations: 1_000,
            mpin_max_attempts: 3,
            ..Config::default()
        })
    }

    fn service_with(config: Config) -> AuthService {
        AuthService::new(
            &config,
            Arc::new(Store::in_memory()),
            Arc::new(CacheService::memory_only()),
        )
    }

    fn registration(email: &str, role: Role) -> RegisterRequest {
        RegisterRequest {
            name: "Meera Iyer".to_string(),
            email: email.to_string(),
            phone: Some("+919876543210".to_string()),
            password: "correct horse".to_string(),
            role,
        }
    }

    #[test]
    fn hashes_verify_and_reject() {
        let encoded = hash_secret("123456", 1_000);
        assert!(encoded.starts_with("pbkdf2-sha256$1000$"));
        assert!(verify_secret("123456", &encoded));
        assert!(!verify_secret("654321", &encoded));
        assert!(!verify_secret("123456", "pbkdf2-sha256$1000$bad"));
        assert!(!verify_secret("123456", "md5$1$aa$bb"));
    }

    #[test]
    fn salts_differ_between_hashes() {
        assert_ne!(hash_secret("123456", 1_000), hash_secret("123456", 1_000));
    }

    #[test]
    fn validates_emails() {
        assert_eq!(normalize_email(" Asha@Campus.EDU ").unwrap(), "asha@campus.edu");
        assert!(normalize_email("asha").is_err());
        assert!(normalize_email("@campus.edu").is_err());
        assert!(normalize_email("asha@campus").is_err());
        assert!(normalize_email("a b@campus.edu").is_err());
    }

    #[tokio::test]
    async fn register_and_login() {
        let auth = service();
        let profile = assert_ok!(
            auth.register(registration("meera@campus.edu", Role::Student))
                .await
        );
        assert_eq!(profile.role, Role::Student);

        let login = assert_ok!(
            auth.login(LoginRequest {
                email: "MEERA@campus.edu".to_string(),
                password: "correct horse".to_string(),
            })
            .await
        );
        let claims = assert_ok!(auth.decode_token(&login.token));
        assert_eq!(claims.sub, profile.id);
        assert_eq!(claims.role, Role::Student);

        let wrong = auth
            .login(LoginRequest {
                email: "meera@campus.edu".to_string(),
                password: "wrong horse".to_string(),
            })
            .await;
        assert!(matches!(wrong, Err(CampusPayError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn rejects_duplicate_and_privileged_registration() {
        let auth = service();
        assert_ok!(auth.register(registration("dup@campus.edu", Role::Vendor)).await);

        let dup = auth.register(registration("DUP@campus.edu", Role::Student)).await;
        assert!(matches!(dup, Err(CampusPayError::Conflict(_))));

        let admin = auth.register(registration("boss@campus.edu", Role::Admin)).await;
        assert!(matches!(admin, Err(CampusPayError::Forbidden(_))));
    }

    #[tokio::test]
    async fn tampered_token_is_rejected() {
        let auth = service();
        let user = auth
            .create_user(
                "Kiran".into(),
                "kiran@campus.edu".into(),
                None,
                Role::Vendor,
                "password123".into(),
            )
            .await
            .unwrap();
        let (token, _) = auth.issue_token(&user).unwrap();

        assert_err!(auth.decode_token(&format!("{}x", token)));
    }

    async fn student_with_mpin(auth: &AuthService) -> Uuid {
        let user = auth
            .create_user(
                "Kiran".into(),
                "kiran@campus.edu".into(),
                None,
                Role::Student,
                "password123".into(),
            )
            .await
            .unwrap();
        auth.set_mpin(
            user.id,
            SetMpinRequest {
                password: "password123".into(),
                mpin: "123456".into(),
            },
        )
        .await
        .unwrap();
        user.id
    }

    #[tokio::test]
    async fn mpin_must_be_set_before_use() {
        let auth = service();
        let user = auth
            .create_user(
                "Kiran".into(),
                "kiran@campus.edu".into(),
                None,
                Role::Student,
                "password123".into(),
            )
            .await
            .unwrap();

        assert!(matches!(
            auth.verify_mpin(user.id, "123456").await,
            Err(CampusPayError::MpinNotSet)
        ));
    }

    #[tokio::test]
    async fn mpin_locks_after_repeated_failures() {
        let auth = service();
        let user_id = student_with_mpin(&auth).await;

        assert_ok!(auth.verify_mpin(user_id, "123456").await);
        assert!(matches!(
            auth.verify_mpin(user_id, "000000").await,
            Err(CampusPayError::InvalidMpin { remaining: 2 })
        ));
        assert!(matches!(
            auth.verify_mpin(user_id, "000000").await,
            Err(CampusPayError::InvalidMpin { remaining: 1 })
        ));
        assert!(matches!(
            auth.verify_mpin(user_id, "000000").await,
            Err(CampusPayError::MpinLocked)
        ));
        // Locked even with the right MPIN until the window passes.
        assert!(matches!(
            auth.verify_mpin(user_id, "123456").await,
            Err(CampusPayError::MpinLocked)
        ));
    }

    #[tokio::test]
    async fn correct_mpin_clears_earlier_failures() {
        let auth = service();
        let user_id = student_with_mpin(&auth).await;

        assert_err!(auth.verify_mpin(user_id, "000000").await);
        assert_err!(auth.verify_mpin(user_id, "000000").await);
        assert_ok!(auth.verify_mpin(user_id, "123456").await);

        // Back to the full allowance.
        assert!(matches!(
            auth.verify_mpin(user_id, "000000").await,
            Err(CampusPayError::InvalidMpin { remaining: 2 })
        ));
    }

    #[tokio::test]
    async fn mpin_lock_lifts_after_window() {
        let auth = service_with(Config {
            password_iterations: 1_000,
            mpin_max_attempts: 2,
            mpin_lockout: Duration::from_millis(200),
            ..Config::default()
        });
        let user_id = student_with_mpin(&auth).await;

        assert_err!(auth.verify_mpin(user_id, "000000").await);
        assert!(matches!(
            auth.verify_mpin(user_id, "000000").await,
            Err(CampusPayError::MpinLocked)
        ));
        assert!(matches!(
            auth.verify_mpin(user_id, "123456").await,
            Err(CampusPayError::MpinLocked)
        ));

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_ok!(auth.verify_mpin(user_id, "123456").await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_guesses_cannot_exceed_attempt_limit() {
        let auth = Arc::new(service_with(Config {
            password_iterations: 1_000,
            mpin_max_attempts: 5,
            ..Config::default()
        }));
        let user_id = student_with_mpin(&auth).await;

        let guesses: Vec<_> = (0..29)
            .map(|i| {
                let auth = auth.clone();
                let guess = format!("{:06}", 200_000 + i);
                tokio::spawn(async move { auth.verify_mpin(user_id, &guess).await })
            })
            .collect();

        let mut checked = Vec::new();
        let mut locked = 0;
        for guess in guesses {
            match guess.await.unwrap() {
                Err(CampusPayError::InvalidMpin { remaining }) => checked.push(remaining),
                Err(CampusPayError::MpinLocked) => locked += 1,
                other => panic!("unexpected result: {:?}", other),
            }
        }
        checked.sort_unstable();
        assert_eq!(checked, vec![1, 2, 3, 4]);
        assert_eq!(locked, 25);

        assert!(matches!(
            auth.verify_mpin(user_id, "123456").await,
            Err(CampusPayError::MpinLocked)
        ));
    }

    #[tokio::test]
    async fn mpin_must_be_six_digits() {
        let auth = service();
        let user = auth
            .create_user(
                "Kiran".into(),
                "kiran@campus.edu".into(),
                None,
                Role::Student,
                "password123".into(),
            )
            .await
            .unwrap();

        let result = auth
            .set_mpin(
                user.id,
                SetMpinRequest {
                    password: "password123".into(),
                    mpin: "12ab56".into(),
                },
            )
            .await;
        assert!(matches!(result, Err(CampusPayError::Validation(_))));
    }
}
