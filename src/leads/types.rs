use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    New,
    Contacted,
    Qualified,
    Disqualified,
    Converted,
}

impl LeadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::New => "new",
            LeadStatus::Contacted => "contacted",
            LeadStatus::Qualified => "qualified",
            LeadStatus::Disqualified => "disqualified",
            LeadStatus::Converted => "converted",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadSource {
    Calling,
    DataEntry,
    Website,
    Referral,
    SocialMedia,
    EmailCampaign,
    Event,
    Other,
}

impl LeadSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadSource::Calling => "calling",
            LeadSource::DataEntry => "data_entry",
            LeadSource::Website => "website",
            LeadSource::Referral => "referral",
            LeadSource::SocialMedia => "social_media",
            LeadSource::EmailCampaign => "email_campaign",
            LeadSource::Event => "event",
            LeadSource::Other => "other",
        }
    }

    /// Which per-channel counter column a lead from this source rolls into.
    pub fn is_calling_channel(&self) -> bool {
        matches!(self, LeadSource::Calling)
    }
}

impl std::str::FromStr for LeadSource {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "calling" => Ok(LeadSource::Calling),
            "data_entry" => Ok(LeadSource::DataEntry),
            "website" => Ok(LeadSource::Website),
            "referral" => Ok(LeadSource::Referral),
            "social_media" => Ok(LeadSource::SocialMedia),
            "email_campaign" => Ok(LeadSource::EmailCampaign),
            "event" => Ok(LeadSource::Event),
            "other" => Ok(LeadSource::Other),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisqualificationReason {
    NoAnswer,
    Unreachable,
    WrongPerson,
    NotInterested,
    AlreadyUsingCompetitor,
    NoBudget,
    NoAuthority,
    DoNotCall,
    LanguageBarrier,
    GatekeeperBlock,
    InvalidPhone,
    InvalidContact,
    Duplicate,
    IncompleteData,
    WrongDemographic,
    CompanySizeMismatch,
    GeographicRestriction,
    BudgetNotAligned,
    OutOfBusiness,
}

impl DisqualificationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisqualificationReason::NoAnswer => "no_answer",
            DisqualificationReason::Unreachable => "unreachable",
            DisqualificationReason::WrongPerson => "wrong_person",
            DisqualificationReason::NotInterested => "not_interested",
            DisqualificationReason::AlreadyUsingCompetitor => "already_using_competitor",
            DisqualificationReason::NoBudget => "no_budget",
            DisqualificationReason::NoAuthority => "no_authority",
            DisqualificationReason::DoNotCall => "do_not_call",
            DisqualificationReason::LanguageBarrier => "language_barrier",
            DisqualificationReason::GatekeeperBlock => "gatekeeper_block",
            DisqualificationReason::InvalidPhone => "invalid_phone",
            DisqualificationReason::InvalidContact => "invalid_contact",
            DisqualificationReason::Duplicate => "duplicate",
            DisqualificationReason::IncompleteData => "incomplete_data",
            DisqualificationReason::WrongDemographic => "wrong_demographic",
            DisqualificationReason::CompanySizeMismatch => "company_size_mismatch",
            DisqualificationReason::GeographicRestriction => "geographic_restriction",
            DisqualificationReason::BudgetNotAligned => "budget_not_aligned",
            DisqualificationReason::OutOfBusiness => "out_of_business",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Created,
    Updated,
    StatusChanged,
    Qualified,
    Disqualified,
    Assigned,
    Contacted,
    EmailSent,
    CallMade,
    MeetingScheduled,
    NoteAdded,
    Converted,
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Created => "created",
            ActivityType::Updated => "updated",
            ActivityType::StatusChanged => "status_changed",
            ActivityType::Qualified => "qualified",
            ActivityType::Disqualified => "disqualified",
            ActivityType::Assigned => "assigned",
            ActivityType::Contacted => "contacted",
            ActivityType::EmailSent => "email_sent",
            ActivityType::CallMade => "call_made",
            ActivityType::MeetingScheduled => "meeting_scheduled",
            ActivityType::NoteAdded => "note_added",
            ActivityType::Converted => "converted",
        }
    }
}

/// Appends a qualification note to whatever notes the lead already carries.
pub fn append_qualify_note(existing: Option<&str>, notes: &str) -> String {
    match existing {
        Some(prev) if !prev.is_empty() => format!("{prev}\n[Qualified] {notes}"),
        _ => format!("[Qualified] {notes}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn status_parses_snake_case() {
        let s: LeadStatus = serde_json::from_str("\"disqualified\"").unwrap();
        assert_eq!(s, LeadStatus::Disqualified);
        assert_eq!(s.as_str(), "disqualified");
    }

    #[test]
    fn source_rejects_unknown_values() {
        let r: Result<LeadSource, _> = serde_json::from_str("\"carrier_pigeon\"");
        assert!(r.is_err());
    }

    #[test]
    fn source_channel_split() {
        assert!(LeadSource::Calling.is_calling_channel());
        assert!(!LeadSource::DataEntry.is_calling_channel());
        assert!(!LeadSource::Website.is_calling_channel());
    }

    #[test]
    fn source_from_stored_string() {
        assert_eq!("calling".parse::<LeadSource>(), Ok(LeadSource::Calling));
        assert_eq!("email_campaign".parse::<LeadSource>(), Ok(LeadSource::EmailCampaign));
        assert!("".parse::<LeadSource>().is_err());
    }

    #[test]
    fn disqualification_reason_round_trips() {
        for raw in [
            "no_answer",
            "already_using_competitor",
            "gatekeeper_block",
            "out_of_business",
        ] {
            let reason: DisqualificationReason =
                serde_json::from_str(&format!("\"{raw}\"")).unwrap();
            assert_eq!(reason.as_str(), raw);
        }
    }

    #[test]
    fn qualify_note_appends_to_existing() {
        assert_eq!(
            append_qualify_note(Some("cold call 1/5"), "budget confirmed"),
            "cold call 1/5\n[Qualified] budget confirmed"
        );
        assert_eq!(
            append_qualify_note(None, "budget confirmed"),
            "[Qualified] budget confirmed"
        );
        assert_eq!(
            append_qualify_note(Some(""), "x"),
            "[Qualified] x"
        );
    }
}
