//! Concern and distribution status tracks

closed_set! {
    /// Global lifecycle status of a concern
    ConcernStatus, "concern status" {
        Pending => "pending",
        Ongoing => "ongoing",
        Escalated => "escalated",
        Resolved => "resolved",
    }
}

closed_set! {
    /// Status track of the handler's assignment
    DistributionStatus, "distribution status" {
        Assigned => "assigned",
        InProgress => "in_progress",
        Escalated => "escalated",
        Resolved => "resolved",
    }
}

impl ConcernStatus {
    /// Distribution status kept in lockstep with this concern status.
    ///
    /// Total over `ConcernStatus`; a new concern status does not compile
    /// until it is given a distribution counterpart here.
    pub const fn distribution_status(self) -> DistributionStatus {
        match self {
            ConcernStatus::Pending => DistributionStatus::Assigned,
            ConcernStatus::Ongoing => DistributionStatus::InProgress,
            ConcernStatus::Escalated => DistributionStatus::Escalated,
            ConcernStatus::Resolved => DistributionStatus::Resolved,
        }
    }

    /// Human-readable label used in notifications
    pub fn label(&self) -> &'static str {
        match self {
            ConcernStatus::Pending => "Pending",
            ConcernStatus::Ongoing => "Ongoing",
            ConcernStatus::Escalated => "Escalated",
            ConcernStatus::Resolved => "Resolved",
        }
    }
}

impl DistributionStatus {
    /// Whether moving from `self` to `next` is the handler's first response
    pub fn acknowledges(self, next: DistributionStatus) -> bool {
        self == DistributionStatus::Assigned && next != DistributionStatus::Assigned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_mapping_table() {
        assert_eq!(ConcernStatus::Pending.distribution_status(), DistributionStatus::Assigned);
        assert_eq!(ConcernStatus::Ongoing.distribution_status(), DistributionStatus::InProgress);
        assert_eq!(ConcernStatus::Escalated.distribution_status(), DistributionStatus::Escalated);
        assert_eq!(ConcernStatus::Resolved.distribution_status(), DistributionStatus::Resolved);
    }

    #[test]
    fn test_mapping_is_injective() {
        let mapped: std::collections::HashSet<_> = ConcernStatus::ALL
            .iter()
            .map(|s| s.distribution_status())
            .collect();
        assert_eq!(mapped.len(), ConcernStatus::ALL.len());
    }

    #[test]
    fn test_acknowledges_only_out_of_assigned() {
        use DistributionStatus::*;
        assert!(Assigned.acknowledges(InProgress));
        assert!(Assigned.acknowledges(Resolved));
        assert!(!Assigned.acknowledges(Assigned));
        assert!(!InProgress.acknowledges(Resolved));
        assert!(!Resolved.acknowledges(Assigned));
    }

    #[test]
    fn test_parse_rejects_unknown_status() {
        let err = "closed".parse::<ConcernStatus>().unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(err.to_string().contains("pending, ongoing, escalated, resolved"));
    }

    #[test]
    fn test_parse_is_case_sensitive() {
        assert!("Pending".parse::<ConcernStatus>().is_err());
        assert_eq!("in_progress".parse::<DistributionStatus>().unwrap(), DistributionStatus::InProgress);
    }

    #[test]
    fn test_serde_uses_storage_names() {
        let json = serde_json::to_string(&DistributionStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
        let parsed: ConcernStatus = serde_json::from_str("\"escalated\"").unwrap();
        assert_eq!(parsed, ConcernStatus::Escalated);
    }
}
