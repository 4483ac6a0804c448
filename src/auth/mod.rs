use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Router, routing::get};
use rand::seq::IndexedRandom;

use crate::{AppResult, AppState};

mod login;
mod logout;
mod register;

pub(crate) use register::check_username;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", get(login::login_page).post(login::login))
        .route("/register", get(register::register_page).post(register::register))
        .route("/logout", get(logout::logout).post(logout::logout))
}

pub(crate) fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// A malformed stored hash counts as a mismatch.
pub(crate) fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(hash) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &hash)
        .is_ok()
}

/// Display name handed to new accounts until they pick their own.
pub(crate) fn random_name() -> String {
    let adjectives = [
        "Diligent", "Inquisitive", "Sleepless", "Methodical", "Caffeinated", "Focused",
        "Scribbling", "Bookish", "Overprepared", "Unhurried", "Puzzled", "Attentive",
        "Analytical", "Cramming", "Meticulous", "Wandering", "Thoughtful", "Tenacious",
    ];
    let nouns = [
        "Scholar", "Apprentice", "Librarian", "Tutor", "Pupil", "Researcher",
        "Notetaker", "Mathematician", "Linguist", "Chemist", "Historian", "Bookworm",
        "Freshman", "Graduate", "Archivist", "Philosopher", "Cartographer", "Debater",
    ];

    let mut rng = rand::rng();
    match (adjectives.choose(&mut rng), nouns.choose(&mut rng)) {
        (Some(adjective), Some(noun)) => format!("{adjective} {noun}"),
        _ => "Nameless Student".to_owned(),
    }
}

/// Where to send someone after logging in. Only paths on this site are
/// followed, anything else falls back to the home page.
pub(crate) fn local_redirect(next: Option<&str>) -> &str {
    match next {
        Some(next) if next.starts_with('/') && !next.starts_with("//") && !next.contains('\\') => {
            next
        }
        _ => "/",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("wrong horse", &hash));
        assert!(!verify_password("correct horse", "not a hash"));
    }

    #[test]
    fn names_have_two_words() {
        assert_eq!(random_name().split(' ').count(), 2);
    }

    #[test]
    fn only_local_redirects() {
        assert_eq!(local_redirect(Some("/rooms/3")), "/rooms/3");
        assert_eq!(local_redirect(Some("//evil.example")), "/");
        assert_eq!(local_redirect(Some("https://evil.example")), "/");
        assert_eq!(local_redirect(Some("/\\evil.example")), "/");
        assert_eq!(local_redirect(None), "/");
    }
}
