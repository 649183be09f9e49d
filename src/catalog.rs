//! Fixed user and service listings, plus the synthetic service records.

use rand::Rng;
use serde_json::Value;

use crate::error::{ApiError, VALIDATION_MESSAGE};
use crate::models::{
    timestamp, CreateServiceRequest, MockService, MockUser, ServiceDetail, ServiceDraft,
    ServiceList, ServiceMetrics, ServiceStatus, UserList
};

pub static USERS: [MockUser; 3] = [
    MockUser { id: 1, name: "John Doe", email: "john@example.com", role: "developer" },
    MockUser { id: 2, name: "Jane Smith", email: "jane@example.com", role: "designer" },
    MockUser { id: 3, name: "Bob Johnson", email: "bob@example.com", role: "manager" }
];

pub static SERVICES: [MockService; 3] = [
    MockService {
        id: "user-service",
        name: "User Service",
        status: ServiceStatus::Running,
        version: "1.2.0",
        last_deployed: "2024-01-15T10:30:00Z"
    },
    MockService {
        id: "auth-service",
        name: "Authentication Service",
        status: ServiceStatus::Running,
        version: "2.1.0",
        last_deployed: "2024-01-14T15:45:00Z"
    },
    MockService {
        id: "notification-service",
        name: "Notification Service",
        status: ServiceStatus::Maintenance,
        version: "1.5.2",
        last_deployed: "2024-01-13T09:20:00Z"
    }
];

const SERVICE_DEPENDENCIES: [&str; 2] = ["database", "redis"];

pub fn list_users() -> UserList {

    UserList {
        users: &USERS,
        total: USERS.len(),
        timestamp: timestamp()
    }

}

pub fn list_services() -> ServiceList {

    ServiceList {
        services: &SERVICES,
        total: SERVICES.len(),
        timestamp: timestamp()
    }

}

/// "payments" becomes "Payments Service". Only the first character changes.
pub fn display_name(id: &str) -> String {

    let mut chars = id.chars();
    match chars.next() {
        Some(first) => format!("{}{} Service", first.to_uppercase(), chars.as_str()),
        None => " Service".to_string()
    }

}

// the id is echoed as-is, no validation
pub fn describe_service<R: Rng>(id: &str, rng: &mut R) -> ServiceDetail {

    ServiceDetail {
        id: id.to_string(),
        name: display_name(id),
        status: ServiceStatus::Running,
        version: "1.0.0",
        last_deployed: timestamp(),
        endpoints: vec![
            format!("https://{}.example.com/api", id),
            format!("https://{}.example.com/health", id)
        ],
        dependencies: SERVICE_DEPENDENCIES,
        metrics: ServiceMetrics {
            requests: rng.gen_range(0..1000),
            errors: rng.gen_range(0..10),
            response_time: rng.gen_range(50..250)
        }
    }

}

/// Lower-cases `name`, keeps only `[a-z0-9]`, whitespace and `-`, then turns
/// every whitespace run into a single `-`.
pub fn slugify(name: &str) -> String {

    let kept: String = name
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace() || *c == '-')
        .collect();

    let mut slug = String::with_capacity(kept.len());
    let mut in_whitespace = false;
    for c in kept.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                slug.push('-');
            }
            in_whitespace = true;
        } else {
            slug.push(c);
            in_whitespace = false;
        }
    }

    slug

}

// null, false, 0 and "" count as absent
fn is_truthy(value: &Value) -> bool {

    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true
    }

}

/// Validates a creation request and derives the service id from its name.
///
/// Accepted values are echoed back exactly as sent, so a numeric `version`
/// stays a number. A present but non-string `name` cannot be slugified and
/// is reported as an internal error.
pub fn create_service_draft(request: CreateServiceRequest, expose_detail: bool) -> Result<ServiceDraft, ApiError> {

    let (Some(name), Some(version)) = (
        request.name.filter(is_truthy),
        request.version.filter(is_truthy)
    ) else {
        return Err(ApiError::Validation(VALIDATION_MESSAGE));
    };

    let Some(id) = name.as_str().map(slugify) else {
        return Err(ApiError::internal(format!("service name is not a string: {}", name), expose_detail));
    };

    Ok(ServiceDraft {
        id,
        name,
        version,
        status: ServiceStatus::Deploying,
        last_deployed: timestamp()
    })

}
