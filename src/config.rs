// Runtime configuration for the API server.
// Every flag falls back to an environment variable, then to a default.

use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "student-server", version, about = "Student/course administration REST API")]
pub struct ServerConfig {
    /// Interface to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// SQLite database file (created if missing)
    #[arg(long, env = "DATABASE_PATH", default_value = "student-admin.db")]
    pub database: PathBuf,

    /// Deployment name reported by the health endpoints
    #[arg(long, env = "APP_ENV", default_value = "development")]
    pub environment: String,

    /// Directory of presentation-layer files served as the fallback route
    #[arg(long, env = "STATIC_DIR")]
    pub static_dir: Option<PathBuf>,

    /// Also write combined.log and error.log into this directory
    #[arg(long, env = "LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Courses JSON imported on startup when the store is empty
    #[arg(long, env = "SEED_COURSES")]
    pub seed_courses: Option<PathBuf>,

    /// Students JSON imported on startup when the store is empty
    #[arg(long, env = "SEED_STUDENTS")]
    pub seed_students: Option<PathBuf>,
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn seeding_enabled(&self) -> bool {
        self.seed_courses.is_some() || self.seed_students.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_flags() {
        let config = ServerConfig::try_parse_from([
            "student-server",
            "--host",
            "127.0.0.1",
            "--port",
            "8080",
            "--database",
            "/tmp/school.db",
            "--environment",
            "production",
            "--seed-courses",
            "courses.json",
        ])
        .unwrap();

        assert_eq!(config.bind_address(), "127.0.0.1:8080");
        assert_eq!(config.database, PathBuf::from("/tmp/school.db"));
        assert_eq!(config.environment, "production");
        assert!(config.seeding_enabled());
        assert!(config.static_dir.is_none());
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn test_rejects_invalid_port() {
        assert!(ServerConfig::try_parse_from(["student-server", "--port", "not-a-port"]).is_err());
    }
}
