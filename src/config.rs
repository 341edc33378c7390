use std::env;

#[derive(Clone)]
pub struct QrConfig {
    pub secret_key: String,
    pub width: u32,
    pub margin: u32,
    pub error_correction: String, // L, M, Q or H
    pub dark_color: String,
    pub light_color: String,
}

impl Default for QrConfig {
    fn default() -> Self {
        Self {
            secret_key: "paradise-pay-qr-secret-key-change-in-production".to_string(),
            width: 300,
            margin: 2,
            error_correction: "M".to_string(),
            dark_color: "#000000".to_string(),
            light_color: "#FFFFFF".to_string(),
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub mail_service_url: String,
    pub mail_service_token: String,
    pub jwt_secret_key: String, // Private key (PEM)
    pub jwt_public_key: String, // Public key (PEM)
    pub auth_issuer: String,
    pub base_url: String,
    pub qr: QrConfig,
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = QrConfig::default();
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            port: env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().expect("PORT must be a number"),
            mail_service_url: env::var("MAIL_SERVICE_URL").unwrap_or_else(|_| "http://localhost:8000/api/v1/send".to_string()),
            mail_service_token: env::var("MAIL_SERVICE_TOKEN").unwrap_or_else(|_| "test-token-1".to_string()),
            jwt_secret_key: env::var("JWT_SECRET_KEY").expect("JWT_SECRET_KEY must be set (Ed25519 Private Key)"),
            jwt_public_key: env::var("JWT_PUBLIC_KEY").expect("JWT_PUBLIC_KEY must be set (Ed25519 Public Key)"),
            auth_issuer: env::var("AUTH_ISSUER").unwrap_or_else(|_| "https://api.paradisepay.com".to_string()),
            base_url: env::var("BASE_URL").unwrap_or_else(|_| "https://paradisepay.com".to_string()),
            qr: QrConfig {
                secret_key: env::var("QR_SECRET_KEY").unwrap_or(defaults.secret_key),
                width: env::var("QR_WIDTH").ok().and_then(|v| v.parse().ok()).unwrap_or(defaults.width),
                margin: env::var("QR_MARGIN").ok().and_then(|v| v.parse().ok()).unwrap_or(defaults.margin),
                error_correction: env::var("QR_ERROR_CORRECTION").unwrap_or(defaults.error_correction),
                dark_color: env::var("QR_DARK_COLOR").unwrap_or(defaults.dark_color),
                light_color: env::var("QR_LIGHT_COLOR").unwrap_or(defaults.light_color),
            },
        }
    }
}
