//! Compact constructors for test data.
//!
//! Defaults are chosen so a test only spells out what it is about:
//! events are published single-venue dinners, people are adults in the
//! 31–40 bracket unless told otherwise.

use chrono::{NaiveDate, Utc};
use meetlocal_core::types::{
    AgeBracket, Event, EventId, Gender, PartyMember, Person, PersonId, PreferenceProfile,
    RegistrationRequest, VenueAllocation,
};
use uuid::Uuid;

/// A published single-venue event on the given date
#[must_use]
pub fn event_on(date: NaiveDate, seats: u32) -> Event {
    Event {
        id: EventId::new(),
        tagline: "Dinner with strangers".to_string(),
        city: "Berlin".to_string(),
        date,
        start_time: "19:00".to_string(),
        end_time: "23:00".to_string(),
        venues: vec![VenueAllocation { venue: "Weinbar Rot".to_string(), seats }],
        is_draft: false,
        is_canceled: false,
        capacity_warning_sent: false,
        created_at: Utc::now(),
    }
}

/// A person with a unique email address
#[must_use]
pub fn person(first_name: &str) -> Person {
    Person {
        id: PersonId::new(),
        email: format!("{}.{}@example.com", first_name.to_lowercase(), Uuid::new_v4().simple()),
        first_name: first_name.to_string(),
        last_name: "Tester".to_string(),
        locale: "en".to_string(),
        is_operator: false,
        preferences: PreferenceProfile::default(),
    }
}

/// An operational administrator
#[must_use]
pub fn operator(first_name: &str) -> Person {
    Person { is_operator: true, ..person(first_name) }
}

/// A party member of the given gender, born on the given date
#[must_use]
pub fn member(gender: Gender, birth_date: NaiveDate) -> PartyMember {
    PartyMember {
        first_name: "Alex".to_string(),
        last_name: "Tester".to_string(),
        email: format!("alex.{}@example.com", Uuid::new_v4().simple()),
        gender,
        birth_date,
        has_children: false,
        preferences: PreferenceProfile::default(),
    }
}

/// A solo registration request for the person, mirroring their details
/// into the party member
#[must_use]
pub fn solo_request(
    event: &Event,
    person: &Person,
    bracket: AgeBracket,
    gender: Gender,
    birth_date: NaiveDate,
) -> RegistrationRequest {
    RegistrationRequest {
        event_id: event.id,
        person_id: person.id,
        bracket,
        primary: PartyMember {
            first_name: person.first_name.clone(),
            last_name: person.last_name.clone(),
            email: person.email.clone(),
            gender,
            birth_date,
            has_children: false,
            preferences: PreferenceProfile::default(),
        },
        companion: None,
    }
}

/// A pair registration request: the person plus an invited companion
#[must_use]
pub fn pair_request(
    event: &Event,
    person: &Person,
    bracket: AgeBracket,
    gender: Gender,
    birth_date: NaiveDate,
    companion: PartyMember,
) -> RegistrationRequest {
    let mut request = solo_request(event, person, bracket, gender, birth_date);
    request.companion = Some(companion);
    request
}
