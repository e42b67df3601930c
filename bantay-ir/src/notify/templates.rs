//! Notification message text

use bantay_common::events::BantayEvent;

/// Subject and plain-text body of a notification email
#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub subject: String,
    pub body: String,
}

/// SMS text for events that notify someone; None for the rest
pub fn sms_text(event: &BantayEvent) -> Option<String> {
    match event {
        BantayEvent::ConcernStatusUpdated {
            concern,
            new_status,
            remarks,
            ..
        } => Some(format!(
            "Bantay: Your concern {} is now {}. Remarks: {}",
            concern.tracking_code,
            new_status.label(),
            remarks
        )),
        BantayEvent::ConcernAssigned { concern, .. } => Some(format!(
            "Bantay: Concern {} ({}) has been assigned to you: {}",
            concern.tracking_code, concern.category, concern.title
        )),
        BantayEvent::ConcernSubmitted { .. } | BantayEvent::DetectionDismissed { .. } => None,
    }
}

/// Email for events that notify someone; None for the rest
pub fn email_message(event: &BantayEvent, recipient_name: &str) -> Option<EmailMessage> {
    match event {
        BantayEvent::ConcernStatusUpdated {
            concern,
            previous_status,
            new_status,
            remarks,
            timestamp,
            ..
        } => Some(EmailMessage {
            subject: format!(
                "[Bantay] {} is now {}",
                concern.tracking_code,
                new_status.label()
            ),
            body: format!(
                "Hello {},\n\n\
                 Your concern \"{}\" ({}) moved from {} to {} on {}.\n\n\
                 Remarks: {}\n\n\
                 Track it any time with code {}.\n",
                recipient_name,
                concern.title,
                concern.tracking_code,
                previous_status.label(),
                new_status.label(),
                timestamp.format("%Y-%m-%d %H:%M UTC"),
                remarks,
                concern.tracking_code
            ),
        }),
        BantayEvent::ConcernAssigned {
            concern,
            distribution,
            ..
        } => Some(EmailMessage {
            subject: format!("[Bantay] New concern assigned: {}", concern.tracking_code),
            body: format!(
                "Hello {},\n\n\
                 A {} concern has been assigned to you on {}.\n\n\
                 Title: {}\n\
                 Details: {}\n\
                 Tracking code: {}\n",
                recipient_name,
                concern.category,
                distribution.assigned_at.format("%Y-%m-%d %H:%M UTC"),
                concern.title,
                concern.description.as_deref().unwrap_or("(none)"),
                concern.tracking_code
            ),
        }),
        BantayEvent::ConcernSubmitted { .. } | BantayEvent::DetectionDismissed { .. } => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bantay_common::models::{
        Actor, ActorRole, Category, Concern, ConcernStatus, Distribution, DistributionStatus,
        OriginType,
    };
    use bantay_common::time;
    use uuid::Uuid;

    fn concern() -> Concern {
        let now = time::now();
        Concern {
            id: Uuid::new_v4(),
            tracking_code: "BNT-20261017-ABCDEF".to_string(),
            origin: OriginType::Manual,
            category: Category::Infrastructure,
            severity: None,
            status: ConcernStatus::Ongoing,
            location: None,
            title: "Broken streetlight".to_string(),
            description: None,
            submitted_by: Some(Uuid::new_v4()),
            version: 1,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    fn distribution(concern: &Concern) -> Distribution {
        let now = time::now();
        Distribution {
            id: Uuid::new_v4(),
            concern_id: concern.id,
            handler_id: Uuid::new_v4(),
            status: DistributionStatus::InProgress,
            assigned_at: now,
            acknowledged_at: Some(now),
            updated_at: now,
        }
    }

    #[test]
    fn test_status_update_sms() {
        let concern = concern();
        let event = BantayEvent::ConcernStatusUpdated {
            distribution: distribution(&concern),
            concern,
            previous_status: ConcernStatus::Pending,
            new_status: ConcernStatus::Ongoing,
            actor: Actor::new(Uuid::new_v4(), ActorRole::PurokLeader),
            remarks: "Crew dispatched".to_string(),
            timestamp: time::now(),
        };

        let text = sms_text(&event).unwrap();
        assert_eq!(
            text,
            "Bantay: Your concern BNT-20261017-ABCDEF is now Ongoing. Remarks: Crew dispatched"
        );

        let email = email_message(&event, "Ana").unwrap();
        assert!(email.subject.contains("is now Ongoing"));
        assert!(email.body.starts_with("Hello Ana,"));
        assert!(email.body.contains("from Pending to Ongoing"));
    }

    #[test]
    fn test_assignment_sms_mentions_category() {
        let concern = concern();
        let event = BantayEvent::ConcernAssigned {
            distribution: distribution(&concern),
            concern,
            timestamp: time::now(),
        };
        let text = sms_text(&event).unwrap();
        assert!(text.contains("(infrastructure)"));
        assert!(text.contains("Broken streetlight"));
    }

    #[test]
    fn test_submission_is_silent() {
        let event = BantayEvent::ConcernSubmitted {
            concern: concern(),
            timestamp: time::now(),
        };
        assert!(sms_text(&event).is_none());
        assert!(email_message(&event, "Ana").is_none());
    }
}
