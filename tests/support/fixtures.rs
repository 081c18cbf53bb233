//! Test fixtures and constants.

/// Standard test secrets used across multiple tests.
pub const STANDARD_SECRETS: &[(&str, &str)] = &[
    ("API_KEY", "sk-test-12345"),
    ("DATABASE_URL", "postgres://localhost/mydb"),
    ("JWT_SECRET", "super-secret-jwt-token"),
];

/// `.env` contents matching `STANDARD_SECRETS`.
pub const STANDARD_ENV: &str = "API_KEY=sk-test-12345\nDATABASE_URL=postgres://localhost/mydb\nJWT_SECRET=super-secret-jwt-token\n";

/// Sample .env with edge cases.
pub const SAMPLE_ENV_COMPLEX: &str = r#"
# This is a comment
SIMPLE=value
QUOTED="quoted value"
SINGLE_QUOTED='single quoted'
SPACES_IN_VALUE=hello world

# Another comment
SPECIAL_CHARS=p@ssw0rd!#$%
"#;
