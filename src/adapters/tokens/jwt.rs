use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    domain::{Identity, UserId},
    ports::tokens::{Error, TokenPort},
};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Claims {
    user_id: Uuid,
    email: String,
    iat: i64,
    exp: i64,
}

/// HS256 tokens signed with a shared secret
pub struct JwtTokens {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl JwtTokens {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation: Validation::new(Algorithm::HS256),
            ttl,
        }
    }
}

impl TokenPort for JwtTokens {
    fn sign(&self, identity: &Identity) -> Result<String, Error> {
        let now = Utc::now();
        let claims = Claims {
            user_id: identity.user_id.0,
            email: identity.email.clone(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|err| Error::Adapter(Box::new(err)))
    }

    fn verify(&self, token: &str) -> Result<Identity, Error> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|err| {
            match err.kind() {
                ErrorKind::ExpiredSignature => Error::Expired,
                _ => Error::Invalid(err.to_string()),
            }
        })?;

        Ok(Identity {
            user_id: UserId(data.claims.user_id),
            email: data.claims.email,
        })
    }
}
