//! Resource status values as reported by the services.
//!
//! Every enum maps each variant to its exact wire string. Strings the enum
//! does not know are kept in `Other` so a new upstream state never breaks
//! deserialization of an otherwise valid response.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Behavior shared by every status vocabulary, so waiters can be written
/// once for all of them.
pub trait WireStatus: Clone + PartialEq + fmt::Display + Send + Sync + 'static {
    fn wire(&self) -> &str;

    /// Terminal failure state.
    fn is_error(&self) -> bool;
}

macro_rules! wire_status {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($variant:ident => $wire:literal,)+
        }
        errors = [$($error:ident),+ $(,)?]
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant,)+
            Other(String),
        }

        impl $name {
            #[must_use]
            pub fn as_str(&self) -> &str {
                match self {
                    $(Self::$variant => $wire,)+
                    Self::Other(raw) => raw,
                }
            }

            /// Terminal failure states; polling stops when one is observed.
            #[must_use]
            pub fn is_error(&self) -> bool {
                matches!(self, $(Self::$error)|+)
            }
        }

        impl WireStatus for $name {
            fn wire(&self) -> &str {
                self.as_str()
            }

            fn is_error(&self) -> bool {
                $name::is_error(self)
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                match raw {
                    $($wire => Self::$variant,)+
                    other => Self::Other(other.to_string()),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                Ok(Self::from(raw.as_str()))
            }
        }
    };
}

wire_status! {
    /// Compute server status (`server.status`).
    ServerStatus {
        Active => "ACTIVE",
        Build => "BUILD",
        Deleted => "DELETED",
        Error => "ERROR",
        HardReboot => "HARD_REBOOT",
        Migrating => "MIGRATING",
        Password => "PASSWORD",
        Paused => "PAUSED",
        Reboot => "REBOOT",
        Rebuild => "REBUILD",
        Rescue => "RESCUE",
        Resize => "RESIZE",
        RevertResize => "REVERT_RESIZE",
        Shelved => "SHELVED",
        ShelvedOffloaded => "SHELVED_OFFLOADED",
        Shutoff => "SHUTOFF",
        SoftDeleted => "SOFT_DELETED",
        Suspended => "SUSPENDED",
        Unknown => "UNKNOWN",
        VerifyResize => "VERIFY_RESIZE",
    }
    errors = [Error]
}

wire_status! {
    /// Block storage volume status.
    VolumeStatus {
        Creating => "creating",
        Available => "available",
        Attaching => "attaching",
        InUse => "in-use",
        Detaching => "detaching",
        Deleting => "deleting",
        Error => "error",
        ErrorDeleting => "error_deleting",
        ErrorRestoring => "error_restoring",
        ErrorExtending => "error_extending",
        Extending => "extending",
        BackingUp => "backing-up",
        RestoringBackup => "restoring-backup",
        Downloading => "downloading",
        Uploading => "uploading",
        Retyping => "retyping",
        Maintenance => "maintenance",
    }
    errors = [Error, ErrorDeleting, ErrorRestoring, ErrorExtending]
}

wire_status! {
    /// Block storage snapshot status.
    SnapshotStatus {
        Creating => "creating",
        Available => "available",
        Deleting => "deleting",
        Error => "error",
        ErrorDeleting => "error_deleting",
    }
    errors = [Error, ErrorDeleting]
}

wire_status! {
    /// Image service (v2) image status.
    ImageStatus {
        Queued => "queued",
        Saving => "saving",
        Active => "active",
        Killed => "killed",
        Deleted => "deleted",
        PendingDelete => "pending_delete",
        Deactivated => "deactivated",
        Uploading => "uploading",
        Importing => "importing",
    }
    errors = [Killed]
}

wire_status! {
    /// Image service asynchronous task status.
    TaskStatus {
        Pending => "pending",
        Processing => "processing",
        Success => "success",
        Failure => "failure",
    }
    errors = [Failure]
}

wire_status! {
    /// Networking status shared by networks and ports.
    NeutronStatus {
        Active => "ACTIVE",
        Down => "DOWN",
        Build => "BUILD",
        Error => "ERROR",
    }
    errors = [Error]
}

wire_status! {
    /// Bare metal node provision state.
    ProvisionState {
        Enroll => "enroll",
        Verifying => "verifying",
        Manageable => "manageable",
        Inspecting => "inspecting",
        InspectFailed => "inspect failed",
        Cleaning => "cleaning",
        CleanWait => "clean wait",
        CleanFailed => "clean failed",
        Available => "available",
        Deploying => "deploying",
        WaitCallBack => "wait call-back",
        DeployFailed => "deploy failed",
        Active => "active",
        Deleting => "deleting",
        Deleted => "deleted",
        Rebuilding => "rebuilding",
        Error => "error",
    }
    errors = [InspectFailed, CleanFailed, DeployFailed, Error]
}

wire_status! {
    /// Bare metal node power state.
    PowerState {
        PowerOn => "power on",
        PowerOff => "power off",
        Rebooting => "rebooting",
        Error => "error",
    }
    errors = [Error]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_wire_strings_map_to_variants() {
        assert_eq!(ServerStatus::from("ACTIVE"), ServerStatus::Active);
        assert_eq!(VolumeStatus::from("in-use"), VolumeStatus::InUse);
        assert_eq!(
            ProvisionState::from("wait call-back"),
            ProvisionState::WaitCallBack
        );
        assert_eq!(PowerState::from("power off"), PowerState::PowerOff);
    }

    #[test]
    fn unknown_strings_are_preserved() {
        let status = VolumeStatus::from("awaiting-transfer");
        assert_eq!(status, VolumeStatus::Other("awaiting-transfer".to_string()));
        assert_eq!(status.as_str(), "awaiting-transfer");
        assert!(!status.is_error());
    }

    #[test]
    fn matching_is_case_sensitive() {
        assert_eq!(
            ServerStatus::from("active"),
            ServerStatus::Other("active".to_string())
        );
    }

    #[test]
    fn error_states_are_flagged() {
        assert!(VolumeStatus::ErrorDeleting.is_error());
        assert!(ServerStatus::Error.is_error());
        assert!(ImageStatus::Killed.is_error());
        assert!(ProvisionState::DeployFailed.is_error());
        assert!(!ServerStatus::Build.is_error());
    }

    #[test]
    fn trait_view_matches_inherent() {
        fn describe<S: WireStatus>(status: &S) -> (String, bool) {
            (status.wire().to_string(), WireStatus::is_error(status))
        }
        assert_eq!(describe(&SnapshotStatus::Error), ("error".to_string(), true));
        assert_eq!(describe(&NeutronStatus::Active), ("ACTIVE".to_string(), false));
    }

    #[test]
    fn serde_uses_wire_strings() {
        let json = serde_json::to_string(&VolumeStatus::BackingUp).unwrap();
        assert_eq!(json, "\"backing-up\"");
        let parsed: ServerStatus = serde_json::from_str("\"VERIFY_RESIZE\"").unwrap();
        assert_eq!(parsed, ServerStatus::VerifyResize);
        let other: TaskStatus = serde_json::from_str("\"paused\"").unwrap();
        assert_eq!(other.to_string(), "paused");
    }
}
