//! Per-component rule tables.

use super::{Warning, code};
use crate::component::Component;
use crate::types::CalDateTime;

type Check = fn(&Component, &mut Vec<Warning>);

/// Declarative rule set for one component type.
#[derive(Debug)]
pub struct ComponentRules {
    /// Properties that must appear exactly once.
    pub required: &'static [&'static str],
    /// Properties that may appear at most once.
    pub at_most_one: &'static [&'static str],
    /// Cross-property checks.
    pub checks: &'static [Check],
}

pub static VCALENDAR: ComponentRules = ComponentRules {
    required: &[],
    at_most_one: &["CALSCALE", "METHOD", "PRODID", "VERSION"],
    checks: &[],
};

pub static VTODO: ComponentRules = ComponentRules {
    required: &["UID", "DTSTAMP"],
    at_most_one: &[
        "CLASS",
        "COMPLETED",
        "CREATED",
        "DESCRIPTION",
        "DTSTART",
        "DUE",
        "DURATION",
        "GEO",
        "LAST-MODIFIED",
        "LOCATION",
        "ORGANIZER",
        "PERCENT-COMPLETE",
        "PRIORITY",
        "RECURRENCE-ID",
        "SEQUENCE",
        "STATUS",
        "SUMMARY",
        "URL",
    ],
    checks: &[
        todo_status,
        todo_start_due,
        todo_due_duration,
        duration_needs_start,
        recurrence_id_type,
        rrule_time_parts,
        single_rrule,
    ],
};

pub static VEVENT: ComponentRules = ComponentRules {
    required: &["UID", "DTSTAMP"],
    at_most_one: &[
        "CLASS",
        "CREATED",
        "DESCRIPTION",
        "DTEND",
        "DTSTART",
        "DURATION",
        "GEO",
        "LAST-MODIFIED",
        "LOCATION",
        "ORGANIZER",
        "PRIORITY",
        "RECURRENCE-ID",
        "SEQUENCE",
        "STATUS",
        "SUMMARY",
        "TRANSP",
        "URL",
    ],
    checks: &[
        event_status,
        event_start_end,
        event_end_duration,
        duration_needs_start,
        recurrence_id_type,
        rrule_time_parts,
        single_rrule,
    ],
};

pub static VJOURNAL: ComponentRules = ComponentRules {
    required: &["UID", "DTSTAMP"],
    at_most_one: &[
        "CLASS",
        "CREATED",
        "DTSTART",
        "LAST-MODIFIED",
        "ORGANIZER",
        "RECURRENCE-ID",
        "SEQUENCE",
        "STATUS",
        "SUMMARY",
        "URL",
    ],
    checks: &[
        journal_status,
        recurrence_id_type,
        rrule_time_parts,
        single_rrule,
    ],
};

pub static VFREEBUSY: ComponentRules = ComponentRules {
    required: &["UID", "DTSTAMP"],
    at_most_one: &["CONTACT", "DTSTART", "DTEND", "ORGANIZER", "URL"],
    checks: &[event_start_end],
};

pub static VALARM: ComponentRules = ComponentRules {
    required: &["ACTION", "TRIGGER"],
    at_most_one: &["DURATION", "REPEAT"],
    checks: &[alarm_repeat_pair],
};

pub static VTIMEZONE: ComponentRules = ComponentRules {
    required: &["TZID"],
    at_most_one: &["LAST-MODIFIED", "TZURL"],
    checks: &[],
};

pub static TZ_TRANSITION: ComponentRules = ComponentRules {
    required: &["DTSTART", "TZOFFSETTO", "TZOFFSETFROM"],
    at_most_one: &[],
    checks: &[single_rrule],
};

const TODO_STATUSES: &[&str] = &["NEEDS-ACTION", "COMPLETED", "IN-PROGRESS", "CANCELLED"];
const EVENT_STATUSES: &[&str] = &["TENTATIVE", "CONFIRMED", "CANCELLED"];
const JOURNAL_STATUSES: &[&str] = &["DRAFT", "FINAL", "CANCELLED"];
const ALL_STATUSES: &[&str] = &[
    "TENTATIVE",
    "CONFIRMED",
    "CANCELLED",
    "NEEDS-ACTION",
    "COMPLETED",
    "IN-PROGRESS",
    "DRAFT",
    "FINAL",
];

fn stamp(component: &Component, name: &str) -> Option<CalDateTime> {
    component.property(name).and_then(|p| p.as_datetime())
}

fn check_status(component: &Component, allowed: &'static [&str], out: &mut Vec<Warning>) {
    let Some(status) = component.property("STATUS").and_then(|p| p.as_text()) else {
        return;
    };
    let status_uc = status.to_uppercase();
    if allowed.contains(&status_uc.as_str()) {
        return;
    }
    // an unknown word is somebody's extension, a known word is a mix-up
    if ALL_STATUSES.contains(&status_uc.as_str()) {
        out.push(
            Warning::new(code::INVALID_STATUS)
                .with_args([status.to_owned(), allowed.join(", ")])
                .for_property("STATUS"),
        );
    }
}

fn todo_status(component: &Component, out: &mut Vec<Warning>) {
    check_status(component, TODO_STATUSES, out);
}

fn event_status(component: &Component, out: &mut Vec<Warning>) {
    check_status(component, EVENT_STATUSES, out);
}

fn journal_status(component: &Component, out: &mut Vec<Warning>) {
    check_status(component, JOURNAL_STATUSES, out);
}

fn check_start_ordering(component: &Component, end_name: &str, out: &mut Vec<Warning>) {
    let Some(start) = stamp(component, "DTSTART") else {
        return;
    };
    let Some(end) = stamp(component, end_name) else {
        return;
    };
    if start.as_instant() > end.as_instant() {
        out.push(
            Warning::new(code::START_AFTER_END)
                .with_args(["DTSTART", end_name])
                .for_property("DTSTART"),
        );
    }
    if start.has_time() != end.has_time() {
        out.push(
            Warning::new(code::START_END_TYPE_MISMATCH)
                .with_args(["DTSTART", end_name])
                .for_property("DTSTART"),
        );
    }
}

fn todo_start_due(component: &Component, out: &mut Vec<Warning>) {
    check_start_ordering(component, "DUE", out);
}

fn event_start_end(component: &Component, out: &mut Vec<Warning>) {
    check_start_ordering(component, "DTEND", out);
}

fn check_exclusive(component: &Component, first: &str, second: &str, out: &mut Vec<Warning>) {
    if component.property(first).is_some() && component.property(second).is_some() {
        out.push(
            Warning::new(code::MUTUALLY_EXCLUSIVE)
                .with_args([first, second])
                .for_property(first),
        );
    }
}

fn todo_due_duration(component: &Component, out: &mut Vec<Warning>) {
    check_exclusive(component, "DUE", "DURATION", out);
}

fn event_end_duration(component: &Component, out: &mut Vec<Warning>) {
    check_exclusive(component, "DTEND", "DURATION", out);
}

fn duration_needs_start(component: &Component, out: &mut Vec<Warning>) {
    if component.property("DURATION").is_some() && component.property("DTSTART").is_none() {
        out.push(
            Warning::new(code::MISSING_COMPANION)
                .with_args(["DURATION", "DTSTART"])
                .for_property("DURATION"),
        );
    }
}

fn recurrence_id_type(component: &Component, out: &mut Vec<Warning>) {
    if let Some(start) = stamp(component, "DTSTART")
        && let Some(recurrence_id) = stamp(component, "RECURRENCE-ID")
        && start.has_time() != recurrence_id.has_time()
    {
        out.push(
            Warning::new(code::RECURRENCE_ID_TYPE_MISMATCH)
                .with_args(["DTSTART", "RECURRENCE-ID"])
                .for_property("RECURRENCE-ID"),
        );
    }
}

fn rrule_time_parts(component: &Component, out: &mut Vec<Warning>) {
    let Some(start) = stamp(component, "DTSTART") else {
        return;
    };
    if start.has_time() {
        return;
    }
    let offending = component
        .properties_named("RRULE")
        .filter_map(|p| p.as_recur())
        .any(|recur| recur.constrains_time());
    if offending {
        out.push(Warning::new(code::TIME_PARTS_WITH_DATE_START).for_property("RRULE"));
    }
}

fn single_rrule(component: &Component, out: &mut Vec<Warning>) {
    if component.properties_named("RRULE").count() > 1 {
        out.push(Warning::new(code::MULTIPLE_RRULES).for_property("RRULE"));
    }
}

fn alarm_repeat_pair(component: &Component, out: &mut Vec<Warning>) {
    if component.property("DURATION").is_some() != component.property("REPEAT").is_some() {
        out.push(
            Warning::new(code::REPEAT_DURATION_PAIR)
                .with_args(["DURATION", "REPEAT"])
                .for_property("DURATION"),
        );
    }
}
