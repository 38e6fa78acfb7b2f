//! Error types for the record layer.

use restoc_codec::CodecError;
use restoc_exec::ExecError;
use thiserror::Error;

/// Result type for record operations.
pub type RecordResult<T> = Result<T, RecordError>;

/// Errors that can occur while compiling or running record operations.
#[derive(Debug, Error)]
pub enum RecordError {
    /// A field declares a type the record layer can't store.
    #[error("\"{type_name}\" is not a valid type for {node_class} nodes")]
    InvalidFieldType {
        /// The declared type.
        type_name: String,
        /// The node class it was declared on.
        node_class: String,
    },

    /// A structured node is used without JSON storage.
    #[error("can not process {class} node \"{field}\" without the json flag set")]
    UnsupportedNode {
        /// Node class (array, hash, parent).
        class: String,
        /// Field name.
        field: String,
    },

    /// A value does not fit its field.
    #[error("invalid value for \"{field}\": {reason}")]
    InvalidValue {
        /// Field name.
        field: String,
        /// What is wrong with it.
        reason: String,
    },

    /// An operator mapping holds no recognized operator.
    #[error(
        "invalid operator set {{{keys}}}, key must be one of \"between\", \"lt\", \"gt\", \"lte\", \"gte\", \"neq\", or \"like\""
    )]
    InvalidOperator {
        /// The keys that were supplied, comma separated.
        keys: String,
    },

    /// A field name is not part of the structure.
    #[error("\"{field}\" is not a field of {table}")]
    UnknownField {
        /// The requested field.
        field: String,
        /// The table searched.
        table: String,
    },

    /// A conflict policy is malformed.
    #[error("invalid conflict policy: {message}")]
    InvalidConflict {
        /// Description of the problem.
        message: String,
    },

    /// A record without a primary key value was deleted or saved.
    #[error("record has no value for primary key \"{field}\"")]
    MissingPrimaryKey {
        /// Primary key field, empty when the structure has none.
        field: String,
    },

    /// Required change-audit fields were not supplied.
    #[error("missing change-audit fields: {}", .fields.join(", "))]
    MissingAuditFields {
        /// The missing field names.
        fields: Vec<String>,
    },

    /// The operation can not attribute change-audit entries.
    #[error("tables with change audit can't use {operation}")]
    AuditNotAllowed {
        /// The refused operation.
        operation: String,
    },

    /// Change audit is off for the table.
    #[error("{table} doesn't keep changes")]
    AuditDisabled {
        /// The table.
        table: String,
    },

    /// The persisted revision moved since the record was read.
    #[error("revision conflict on record {primary}")]
    RevisionConflict {
        /// The primary key of the record.
        primary: String,
    },

    /// A structure description is inconsistent.
    #[error("invalid structure: {message}")]
    InvalidStructure {
        /// Description of the problem.
        message: String,
    },

    /// An operation received an argument it can't use.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Description of the problem.
        message: String,
    },

    /// A unique or primary key constraint was violated.
    #[error("duplicate entry '{value}' for key '{key}'")]
    Duplicate {
        /// The duplicated value.
        value: String,
        /// The violated key.
        key: String,
    },

    /// Executor failure passed through.
    #[error("executor error: {0}")]
    Exec(ExecError),

    /// JSON encoding or decoding failure.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
}

impl From<ExecError> for RecordError {
    fn from(err: ExecError) -> Self {
        match err {
            ExecError::Duplicate { value, key } => Self::Duplicate { value, key },
            other => Self::Exec(other),
        }
    }
}

impl RecordError {
    /// Creates an invalid value error.
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid conflict policy error.
    pub fn invalid_conflict(message: impl Into<String>) -> Self {
        Self::InvalidConflict {
            message: message.into(),
        }
    }

    /// Creates an invalid structure error.
    pub fn invalid_structure(message: impl Into<String>) -> Self {
        Self::InvalidStructure {
            message: message.into(),
        }
    }

    /// Creates an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates an unknown field error.
    pub fn unknown_field(field: impl Into<String>, table: impl Into<String>) -> Self {
        Self::UnknownField {
            field: field.into(),
            table: table.into(),
        }
    }

    /// Creates a refused-operation error for audited tables.
    pub fn audit_not_allowed(operation: impl Into<String>) -> Self {
        Self::AuditNotAllowed {
            operation: operation.into(),
        }
    }

    /// Returns true for errors caused by bad structures or arguments.
    ///
    /// These fail before anything reaches a host and are never worth
    /// retrying.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidFieldType { .. }
                | Self::UnsupportedNode { .. }
                | Self::InvalidValue { .. }
                | Self::InvalidOperator { .. }
                | Self::UnknownField { .. }
                | Self::InvalidConflict { .. }
                | Self::MissingAuditFields { .. }
                | Self::AuditNotAllowed { .. }
                | Self::AuditDisabled { .. }
                | Self::InvalidStructure { .. }
                | Self::InvalidArgument { .. }
        )
    }

    /// Returns true for data conflicts (duplicate key, stale revision).
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Duplicate { .. } | Self::RevisionConflict { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_exec_error_is_lifted() {
        let err: RecordError = ExecError::Duplicate {
            value: "a@b.c".into(),
            key: "ui_email".into(),
        }
        .into();
        assert!(matches!(err, RecordError::Duplicate { .. }));
        assert!(err.is_conflict());
    }

    #[test]
    fn other_exec_errors_pass_through() {
        let err: RecordError = ExecError::UnknownHost {
            host: "replica".into(),
        }
        .into();
        assert!(matches!(err, RecordError::Exec(_)));
        assert!(!err.is_configuration());
    }

    #[test]
    fn classification() {
        assert!(RecordError::invalid_conflict("x").is_configuration());
        assert!(RecordError::MissingAuditFields {
            fields: vec!["user".into()]
        }
        .is_configuration());
        assert!(RecordError::RevisionConflict {
            primary: "1".into()
        }
        .is_conflict());
        assert!(!RecordError::MissingPrimaryKey {
            field: "_id".into()
        }
        .is_conflict());
    }

    #[test]
    fn messages() {
        let err = RecordError::MissingAuditFields {
            fields: vec!["user".into(), "reason".into()],
        };
        assert_eq!(err.to_string(), "missing change-audit fields: user, reason");
    }
}
