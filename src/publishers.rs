//! The log publisher catalog.
//!
//! Every publisher type is one [`ResourceSchema`] table. Each table is exposed
//! three ways:
//!
//! - `dirconfig_<type>_log_publisher`: a resource that creates the publisher;
//! - `dirconfig_default_<type>_log_publisher`: a resource that adopts a
//!   publisher the server ships with, and only forgets it on delete;
//! - `dirconfig_<type>_log_publisher`: a data source that reads one publisher.

use crate::config::PROVIDER_CONFIG_ATTRIBUTES;
use crate::resource::CreatePolicy;
use crate::schema::{AttributeSchema, ProviderSchema, ResourceSchema};

/// Prefix shared by every resource and data source name.
pub const NAME_PREFIX: &str = "dirconfig_";

const RESOURCE_SUFFIX: &str = "_log_publisher";
const DEFAULT_INFIX: &str = "default_";

const ERROR_SEVERITIES: &[&str] = &[
    "debug",
    "fatal-error",
    "info",
    "mild-error",
    "mild-warning",
    "notice",
    "severe-error",
    "severe-warning",
];

const COMPRESSION_MECHANISMS: &[&str] = &["none", "gzip", "gzip-with-encryption"];

const TIMESTAMP_PRECISIONS: &[&str] = &["seconds", "milliseconds"];

const LOGGING_ERROR_BEHAVIORS: &[&str] = &["standard-error", "lock-down-mode"];

const DEBUG_LEVELS: &[&str] = &["disabled", "error", "warning", "info", "verbose", "all"];

const SYSLOG_FACILITIES: &[&str] = &[
    "kernel-messages",
    "user-level-messages",
    "mail-system",
    "system-daemons",
    "security-authorization-messages-1",
    "messages-generated-internally-by-syslogd",
    "line-printer-subsystem",
    "network-news-subsystem",
    "uucp-subsystem",
    "clock-daemon-1",
    "security-authorization-messages-2",
    "ftp-daemon",
    "ntp-subsystem",
    "log-audit",
    "log-alert",
    "clock-daemon-2",
    "local-0",
    "local-1",
    "local-2",
    "local-3",
    "local-4",
    "local-5",
    "local-6",
    "local-7",
];

const SYSLOG_SEVERITIES: &[&str] = &[
    "emergency",
    "alert",
    "critical",
    "error",
    "warning",
    "notice",
    "informational",
    "debug",
];

const OUTPUT_LOCATIONS: &[&str] = &["standard-output", "standard-error"];

const ENABLED: AttributeSchema = AttributeSchema::bool("enabled")
    .required()
    .with_description("Whether the publisher is enabled");
const DESCRIPTION: AttributeSchema =
    AttributeSchema::string("description").with_description("Description of the publisher");
const LOG_FILE: AttributeSchema = AttributeSchema::string("log-file")
    .required()
    .with_description("Path of the log file, relative to the server root or absolute");
const LOG_FILE_PERMISSIONS: AttributeSchema = AttributeSchema::string("log-file-permissions")
    .server_default()
    .with_description("UNIX permissions of the log files, e.g. 600");
const ROTATION_POLICY: AttributeSchema = AttributeSchema::string_set("rotation-policy")
    .required()
    .with_description("Rotation policies applied to the log files");
const ROTATION_LISTENER: AttributeSchema = AttributeSchema::string_set("rotation-listener")
    .with_description("Listeners notified when a log file is rotated");
const RETENTION_POLICY: AttributeSchema = AttributeSchema::string_set("retention-policy")
    .required()
    .with_description("Retention policies applied to rotated log files");
const COMPRESSION_MECHANISM: AttributeSchema =
    AttributeSchema::enumeration("compression-mechanism", COMPRESSION_MECHANISMS)
        .server_default()
        .with_description("How log files are compressed as they are written");
const SIGNING_ENABLED: AttributeSchema = AttributeSchema::bool("signing-enabled")
    .server_default()
    .with_description("Whether rotated log files are cryptographically signed");
const ENCRYPT_LOG: AttributeSchema = AttributeSchema::bool("encrypt-log")
    .server_default()
    .with_description("Whether log files are encrypted");
const ENCRYPTION_SETTINGS_DEFINITION_ID: AttributeSchema =
    AttributeSchema::string("encryption-settings-definition-id")
        .with_description("Encryption settings definition used when encrypt-log is set");
const APPEND: AttributeSchema = AttributeSchema::bool("append")
    .server_default()
    .with_description("Append to an existing log file instead of replacing it");
const ASYNCHRONOUS: AttributeSchema = AttributeSchema::bool("asynchronous")
    .server_default()
    .with_description("Write records from a background thread");
const AUTO_FLUSH: AttributeSchema = AttributeSchema::bool("auto-flush")
    .server_default()
    .with_description("Flush after every record");
const BUFFER_SIZE: AttributeSchema = AttributeSchema::string("buffer-size")
    .server_default()
    .with_units()
    .with_description("Write buffer size, e.g. 64 kb");
const QUEUE_SIZE: AttributeSchema = AttributeSchema::int("queue-size")
    .server_default()
    .with_description("Maximum records queued for asynchronous writing");
const TIME_INTERVAL: AttributeSchema = AttributeSchema::string("time-interval")
    .server_default()
    .with_units()
    .with_description("Interval between buffer flushes, e.g. 5 seconds");
const TIMESTAMP_PRECISION: AttributeSchema =
    AttributeSchema::enumeration("timestamp-precision", TIMESTAMP_PRECISIONS)
        .server_default()
        .with_description("Precision of record timestamps");
const LOGGING_ERROR_BEHAVIOR: AttributeSchema =
    AttributeSchema::enumeration("logging-error-behavior", LOGGING_ERROR_BEHAVIORS)
        .server_default()
        .with_description("What the server does when a record cannot be written");
const MAX_STRING_LENGTH: AttributeSchema = AttributeSchema::int("max-string-length")
    .server_default()
    .with_description("Longest string value written before truncation");
const LOG_CONNECTS: AttributeSchema =
    AttributeSchema::bool("log-connects").server_default();
const LOG_DISCONNECTS: AttributeSchema =
    AttributeSchema::bool("log-disconnects").server_default();
const LOG_REQUESTS: AttributeSchema =
    AttributeSchema::bool("log-requests").server_default();
const LOG_RESULTS: AttributeSchema = AttributeSchema::bool("log-results").server_default();
const LOG_SECURITY_NEGOTIATION: AttributeSchema =
    AttributeSchema::bool("log-security-negotiation").server_default();
const INCLUDE_PRODUCT_NAME: AttributeSchema =
    AttributeSchema::bool("include-product-name").server_default();
const INCLUDE_INSTANCE_NAME: AttributeSchema =
    AttributeSchema::bool("include-instance-name").server_default();
const INCLUDE_STARTUP_ID: AttributeSchema =
    AttributeSchema::bool("include-startup-id").server_default();
const INCLUDE_THREAD_ID: AttributeSchema =
    AttributeSchema::bool("include-thread-id").server_default();
const INCLUDE_REQUESTER_IP_ADDRESS: AttributeSchema =
    AttributeSchema::bool("include-requester-ip-address").server_default();
const INCLUDE_REQUEST_DETAILS_IN_RESULT_MESSAGES: AttributeSchema =
    AttributeSchema::bool("include-request-details-in-result-messages").server_default();
const GENERIFY_MESSAGE_STRINGS: AttributeSchema =
    AttributeSchema::bool("generify-message-strings-when-possible").server_default();
const CONNECTION_CRITERIA: AttributeSchema = AttributeSchema::string("connection-criteria")
    .with_description("Only log operations on connections matching these criteria");
const REQUEST_CRITERIA: AttributeSchema = AttributeSchema::string("request-criteria")
    .with_description("Only log requests matching these criteria");
const RESULT_CRITERIA: AttributeSchema = AttributeSchema::string("result-criteria")
    .with_description("Only log results matching these criteria");
const LOG_FIELD_BEHAVIOR: AttributeSchema = AttributeSchema::string("log-field-behavior")
    .with_description("Log field behavior controlling which fields are written");
const WRITE_MULTI_LINE_MESSAGES: AttributeSchema =
    AttributeSchema::bool("write-multi-line-messages").server_default();
const DEFAULT_SEVERITY: AttributeSchema =
    AttributeSchema::string_set("default-severity")
        .server_default()
        .with_description("Severities logged for categories without an override");
const OVERRIDE_SEVERITY: AttributeSchema = AttributeSchema::string_set("override-severity")
    .with_description("Per-category severities, e.g. access-control=info,warning");
const SYSLOG_EXTERNAL_SERVER: AttributeSchema =
    AttributeSchema::string_set("syslog-external-server")
        .required()
        .with_description("Syslog servers records are sent to");
const SYSLOG_FACILITY: AttributeSchema =
    AttributeSchema::enumeration("syslog-facility", SYSLOG_FACILITIES)
        .server_default()
        .with_description("Syslog facility used for records");
const SYSLOG_SEVERITY: AttributeSchema =
    AttributeSchema::enumeration("syslog-severity", SYSLOG_SEVERITIES)
        .server_default()
        .with_description("Syslog severity used for records");
const SYSLOG_MESSAGE_HOST_NAME: AttributeSchema =
    AttributeSchema::string("syslog-message-host-name")
        .with_description("Host name placed in syslog records");
const SYSLOG_MESSAGE_APPLICATION_NAME: AttributeSchema =
    AttributeSchema::string("syslog-message-application-name")
        .with_description("Application name placed in syslog records");

/// File based access log publisher.
pub const FILE_BASED_ACCESS: ResourceSchema = ResourceSchema {
    publisher_type: "file-based-access",
    description: "Writes access log records to a file",
    attributes: &[
        ENABLED,
        DESCRIPTION,
        LOG_FILE,
        LOG_FILE_PERMISSIONS,
        ROTATION_POLICY,
        ROTATION_LISTENER,
        RETENTION_POLICY,
        COMPRESSION_MECHANISM,
        SIGNING_ENABLED,
        ENCRYPT_LOG,
        ENCRYPTION_SETTINGS_DEFINITION_ID,
        APPEND,
        ASYNCHRONOUS,
        AUTO_FLUSH,
        BUFFER_SIZE,
        QUEUE_SIZE,
        TIME_INTERVAL,
        TIMESTAMP_PRECISION,
        LOG_CONNECTS,
        LOG_DISCONNECTS,
        LOG_REQUESTS,
        LOG_RESULTS,
        LOG_SECURITY_NEGOTIATION,
        INCLUDE_PRODUCT_NAME,
        INCLUDE_INSTANCE_NAME,
        INCLUDE_STARTUP_ID,
        INCLUDE_THREAD_ID,
        INCLUDE_REQUESTER_IP_ADDRESS,
        INCLUDE_REQUEST_DETAILS_IN_RESULT_MESSAGES,
        GENERIFY_MESSAGE_STRINGS,
        MAX_STRING_LENGTH,
        LOG_FIELD_BEHAVIOR,
        CONNECTION_CRITERIA,
        REQUEST_CRITERIA,
        RESULT_CRITERIA,
        LOGGING_ERROR_BEHAVIOR,
    ],
};

/// File based JSON access log publisher.
pub const FILE_BASED_JSON_ACCESS: ResourceSchema = ResourceSchema {
    publisher_type: "file-based-json-access",
    description: "Writes access log records to a file as JSON objects",
    attributes: &[
        ENABLED,
        DESCRIPTION,
        LOG_FILE,
        LOG_FILE_PERMISSIONS,
        ROTATION_POLICY,
        ROTATION_LISTENER,
        RETENTION_POLICY,
        COMPRESSION_MECHANISM,
        SIGNING_ENABLED,
        ENCRYPT_LOG,
        APPEND,
        ASYNCHRONOUS,
        AUTO_FLUSH,
        BUFFER_SIZE,
        QUEUE_SIZE,
        TIME_INTERVAL,
        WRITE_MULTI_LINE_MESSAGES,
        LOG_CONNECTS,
        LOG_DISCONNECTS,
        LOG_REQUESTS,
        LOG_RESULTS,
        INCLUDE_PRODUCT_NAME,
        INCLUDE_INSTANCE_NAME,
        INCLUDE_STARTUP_ID,
        INCLUDE_THREAD_ID,
        INCLUDE_REQUESTER_IP_ADDRESS,
        MAX_STRING_LENGTH,
        LOG_FIELD_BEHAVIOR,
        CONNECTION_CRITERIA,
        REQUEST_CRITERIA,
        RESULT_CRITERIA,
        LOGGING_ERROR_BEHAVIOR,
    ],
};

/// File based error log publisher.
pub const FILE_BASED_ERROR: ResourceSchema = ResourceSchema {
    publisher_type: "file-based-error",
    description: "Writes error log records to a file",
    attributes: &[
        ENABLED,
        DESCRIPTION,
        LOG_FILE,
        LOG_FILE_PERMISSIONS,
        ROTATION_POLICY,
        ROTATION_LISTENER,
        RETENTION_POLICY,
        COMPRESSION_MECHANISM,
        SIGNING_ENABLED,
        ENCRYPT_LOG,
        APPEND,
        ASYNCHRONOUS,
        AUTO_FLUSH,
        BUFFER_SIZE,
        QUEUE_SIZE,
        TIME_INTERVAL,
        TIMESTAMP_PRECISION,
        INCLUDE_PRODUCT_NAME,
        INCLUDE_INSTANCE_NAME,
        INCLUDE_STARTUP_ID,
        INCLUDE_THREAD_ID,
        GENERIFY_MESSAGE_STRINGS,
        DEFAULT_SEVERITY,
        OVERRIDE_SEVERITY,
        LOGGING_ERROR_BEHAVIOR,
    ],
};

/// File based audit log publisher.
pub const FILE_BASED_AUDIT: ResourceSchema = ResourceSchema {
    publisher_type: "file-based-audit",
    description: "Writes changes made to the data as LDIF audit records",
    attributes: &[
        ENABLED,
        DESCRIPTION,
        LOG_FILE,
        LOG_FILE_PERMISSIONS,
        ROTATION_POLICY,
        ROTATION_LISTENER,
        RETENTION_POLICY,
        COMPRESSION_MECHANISM,
        SIGNING_ENABLED,
        ENCRYPT_LOG,
        APPEND,
        ASYNCHRONOUS,
        AUTO_FLUSH,
        BUFFER_SIZE,
        QUEUE_SIZE,
        TIME_INTERVAL,
        TIMESTAMP_PRECISION,
        AttributeSchema::bool("use-reversible-form")
            .server_default()
            .with_description("Write records that can be used to undo the change"),
        AttributeSchema::bool("suppress-internal-operations").server_default(),
        AttributeSchema::bool("suppress-replication-operations").server_default(),
        AttributeSchema::bool("include-replication-change-id").server_default(),
        AttributeSchema::string_set("exclude-attribute")
            .with_description("Attributes omitted from audit records"),
        AttributeSchema::string_set("obscure-attribute")
            .with_description("Attributes whose values are obscured in audit records"),
        CONNECTION_CRITERIA,
        REQUEST_CRITERIA,
        RESULT_CRITERIA,
        LOGGING_ERROR_BEHAVIOR,
    ],
};

/// File based debug log publisher.
pub const FILE_BASED_DEBUG: ResourceSchema = ResourceSchema {
    publisher_type: "file-based-debug",
    description: "Writes debug records to a file",
    attributes: &[
        ENABLED,
        DESCRIPTION,
        LOG_FILE,
        LOG_FILE_PERMISSIONS,
        ROTATION_POLICY,
        ROTATION_LISTENER,
        RETENTION_POLICY,
        COMPRESSION_MECHANISM,
        APPEND,
        ASYNCHRONOUS,
        AUTO_FLUSH,
        BUFFER_SIZE,
        QUEUE_SIZE,
        TIME_INTERVAL,
        AttributeSchema::enumeration("default-debug-level", DEBUG_LEVELS)
            .server_default()
            .with_description("Lowest level of debug messages written"),
        AttributeSchema::string_set("default-debug-category")
            .with_description("Debug categories written by default"),
        AttributeSchema::bool("default-omit-method-entry-arguments").server_default(),
        AttributeSchema::bool("default-omit-method-return-value").server_default(),
        AttributeSchema::bool("default-include-throwable-cause").server_default(),
        AttributeSchema::int("default-throwable-stack-frames").server_default(),
        LOGGING_ERROR_BEHAVIOR,
    ],
};

/// File based trace log publisher.
pub const FILE_BASED_TRACE: ResourceSchema = ResourceSchema {
    publisher_type: "file-based-trace",
    description: "Writes HTTP trace records to a file",
    attributes: &[
        ENABLED,
        DESCRIPTION,
        LOG_FILE,
        LOG_FILE_PERMISSIONS,
        ROTATION_POLICY,
        ROTATION_LISTENER,
        RETENTION_POLICY,
        COMPRESSION_MECHANISM,
        SIGNING_ENABLED,
        ENCRYPT_LOG,
        APPEND,
        ASYNCHRONOUS,
        AUTO_FLUSH,
        BUFFER_SIZE,
        QUEUE_SIZE,
        TIME_INTERVAL,
        TIMESTAMP_PRECISION,
        AttributeSchema::string_set("http-message-type")
            .with_description("HTTP message types traced, e.g. request and response"),
        AttributeSchema::string_set("debug-message-type")
            .with_description("Debug message types traced"),
        AttributeSchema::enumeration("debug-log-level", DEBUG_LEVELS).server_default(),
        AttributeSchema::string_set("include-path-pattern")
            .with_description("Request paths that are traced"),
        AttributeSchema::string_set("exclude-path-pattern")
            .with_description("Request paths that are never traced"),
        MAX_STRING_LENGTH,
        LOGGING_ERROR_BEHAVIOR,
    ],
};

/// Syslog based access log publisher.
pub const SYSLOG_BASED_ACCESS: ResourceSchema = ResourceSchema {
    publisher_type: "syslog-based-access",
    description: "Sends access log records to syslog servers",
    attributes: &[
        ENABLED,
        DESCRIPTION,
        SYSLOG_EXTERNAL_SERVER,
        SYSLOG_FACILITY,
        SYSLOG_SEVERITY,
        SYSLOG_MESSAGE_HOST_NAME,
        SYSLOG_MESSAGE_APPLICATION_NAME,
        QUEUE_SIZE,
        LOG_CONNECTS,
        LOG_DISCONNECTS,
        LOG_REQUESTS,
        LOG_RESULTS,
        LOG_SECURITY_NEGOTIATION,
        INCLUDE_PRODUCT_NAME,
        INCLUDE_INSTANCE_NAME,
        INCLUDE_STARTUP_ID,
        INCLUDE_THREAD_ID,
        INCLUDE_REQUESTER_IP_ADDRESS,
        INCLUDE_REQUEST_DETAILS_IN_RESULT_MESSAGES,
        GENERIFY_MESSAGE_STRINGS,
        MAX_STRING_LENGTH,
        LOG_FIELD_BEHAVIOR,
        CONNECTION_CRITERIA,
        REQUEST_CRITERIA,
        RESULT_CRITERIA,
        LOGGING_ERROR_BEHAVIOR,
    ],
};

/// Syslog based error log publisher.
pub const SYSLOG_BASED_ERROR: ResourceSchema = ResourceSchema {
    publisher_type: "syslog-based-error",
    description: "Sends error log records to syslog servers",
    attributes: &[
        ENABLED,
        DESCRIPTION,
        SYSLOG_EXTERNAL_SERVER,
        SYSLOG_FACILITY,
        SYSLOG_MESSAGE_HOST_NAME,
        SYSLOG_MESSAGE_APPLICATION_NAME,
        QUEUE_SIZE,
        INCLUDE_PRODUCT_NAME,
        INCLUDE_INSTANCE_NAME,
        INCLUDE_STARTUP_ID,
        INCLUDE_THREAD_ID,
        GENERIFY_MESSAGE_STRINGS,
        DEFAULT_SEVERITY,
        OVERRIDE_SEVERITY,
        LOGGING_ERROR_BEHAVIOR,
    ],
};

/// Console JSON access log publisher.
pub const CONSOLE_JSON_ACCESS: ResourceSchema = ResourceSchema {
    publisher_type: "console-json-access",
    description: "Writes access log records as JSON to the server's standard output or error",
    attributes: &[
        ENABLED,
        DESCRIPTION,
        AttributeSchema::enumeration("output-location", OUTPUT_LOCATIONS)
            .server_default()
            .with_description("Stream the records are written to"),
        WRITE_MULTI_LINE_MESSAGES,
        LOG_CONNECTS,
        LOG_DISCONNECTS,
        LOG_REQUESTS,
        LOG_RESULTS,
        INCLUDE_PRODUCT_NAME,
        INCLUDE_INSTANCE_NAME,
        INCLUDE_STARTUP_ID,
        INCLUDE_THREAD_ID,
        INCLUDE_REQUESTER_IP_ADDRESS,
        MAX_STRING_LENGTH,
        LOG_FIELD_BEHAVIOR,
        CONNECTION_CRITERIA,
        REQUEST_CRITERIA,
        RESULT_CRITERIA,
    ],
};

/// Every publisher type the provider manages.
pub const PUBLISHERS: &[ResourceSchema] = &[
    FILE_BASED_ACCESS,
    FILE_BASED_JSON_ACCESS,
    FILE_BASED_ERROR,
    FILE_BASED_AUDIT,
    FILE_BASED_DEBUG,
    FILE_BASED_TRACE,
    SYSLOG_BASED_ACCESS,
    SYSLOG_BASED_ERROR,
    CONSOLE_JSON_ACCESS,
];

/// Name of the resource that creates publishers of this type.
pub fn resource_name(schema: &ResourceSchema) -> String {
    format!("{}{}{}", NAME_PREFIX, schema.type_slug(), RESOURCE_SUFFIX)
}

/// Name of the resource that adopts an existing publisher of this type.
pub fn default_resource_name(schema: &ResourceSchema) -> String {
    format!(
        "{}{}{}{}",
        NAME_PREFIX,
        DEFAULT_INFIX,
        schema.type_slug(),
        RESOURCE_SUFFIX
    )
}

/// Resolve a resource type name to its schema and create policy.
pub fn lookup_resource(name: &str) -> Option<(&'static ResourceSchema, CreatePolicy)> {
    let slug = name
        .strip_prefix(NAME_PREFIX)?
        .strip_suffix(RESOURCE_SUFFIX)?;
    let (slug, policy) = match slug.strip_prefix(DEFAULT_INFIX) {
        Some(rest) => (rest, CreatePolicy::AdoptExisting),
        None => (slug, CreatePolicy::CreateIfAbsent),
    };
    PUBLISHERS
        .iter()
        .find(|schema| schema.type_slug() == slug)
        .map(|schema| (schema, policy))
}

/// Resolve a data source type name to its schema.
pub fn lookup_data_source(name: &str) -> Option<&'static ResourceSchema> {
    match lookup_resource(name)? {
        (schema, CreatePolicy::CreateIfAbsent) => Some(schema),
        (_, CreatePolicy::AdoptExisting) => None,
    }
}

/// The complete provider schema.
pub fn provider_schema() -> ProviderSchema {
    PUBLISHERS.iter().fold(
        ProviderSchema::new().with_provider_config(PROVIDER_CONFIG_ATTRIBUTES),
        |schema, publisher| {
            schema
                .with_resource(resource_name(publisher), *publisher)
                .with_resource(default_resource_name(publisher), *publisher)
                .with_data_source(resource_name(publisher), *publisher)
        },
    )
}
