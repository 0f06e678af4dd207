//! Admission control: capacity gate, duplicate check, age-bracket
//! classifier and gender-ratio evaluator, composed into a single
//! evaluator.
//!
//! Everything here is pure: the evaluator consumes a snapshot read under
//! the registration unit of work's event lock and decides `Admit`,
//! `Waitlist` or a typed rejection. No check mutates state, and any
//! rejection short-circuits before later checks run.

use crate::error::{AdmissionError, PartyRole};
use crate::policy::AdmissionPolicy;
use crate::types::{age_on, AgeBracket, Event, Gender, PartyMember, RegistrationRequest};
use chrono::NaiveDate;

/// Gender tally of the `Registered` participants in one event bracket
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BracketTally {
    /// Registered males in the bracket
    pub male: u32,
    /// Registered females in the bracket
    pub female: u32,
    /// All registered participants in the bracket, diverse/unset included
    pub total: u32,
}

impl BracketTally {
    /// Adds one registered participant of the given gender
    pub const fn add(&mut self, gender: Gender) {
        match gender {
            Gender::Male => self.male += 1,
            Gender::Female => self.female += 1,
            Gender::Diverse | Gender::Unset => {}
        }
        self.total += 1;
    }
}

/// The state a registration decision is made against, read atomically
/// with the writes that follow it
#[derive(Clone, Debug)]
pub struct AdmissionSnapshot {
    /// The event registered for
    pub event: Event,
    /// Registered participants across all brackets
    pub registered_count: u32,
    /// Gender tally of the requested bracket
    pub bracket: BracketTally,
    /// Whether the person already holds an active registration for this
    /// event and bracket
    pub duplicate: bool,
}

/// Outcome of an admission evaluation that creates state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Admission {
    /// Admit the party; a pending payment holds their seats
    Admit,
    /// Defer the party to the bracket's waitlist
    Waitlist,
}

/// Composes the admission checks in order: capacity, duplicate, age
/// bracket, gender ratio.
#[derive(Clone, Debug)]
pub struct AdmissionEvaluator {
    policy: AdmissionPolicy,
}

impl AdmissionEvaluator {
    /// Creates an evaluator with the given policy
    #[must_use]
    pub const fn new(policy: AdmissionPolicy) -> Self {
        Self { policy }
    }

    /// The policy this evaluator applies
    #[must_use]
    pub const fn policy(&self) -> &AdmissionPolicy {
        &self.policy
    }

    /// Evaluates a registration request against a snapshot.
    ///
    /// `today` is the current calendar date in the venue time zone and
    /// drives the age computation.
    ///
    /// # Errors
    ///
    /// Returns the first failing validation: `EventNotOpen`,
    /// `CapacityExceeded`, `DuplicateRegistration`, `CompanionConflict`
    /// or `AgeBracketMismatch`.
    pub fn evaluate(
        &self,
        snapshot: &AdmissionSnapshot,
        request: &RegistrationRequest,
        today: NaiveDate,
    ) -> Result<Admission, AdmissionError> {
        if !snapshot.event.is_open() {
            return Err(AdmissionError::EventNotOpen);
        }
        if snapshot.registered_count >= snapshot.event.capacity() {
            return Err(AdmissionError::CapacityExceeded);
        }
        if snapshot.duplicate {
            return Err(AdmissionError::DuplicateRegistration);
        }
        if let Some(companion) = &request.companion {
            if companion.email.eq_ignore_ascii_case(&request.primary.email) {
                return Err(AdmissionError::CompanionConflict);
            }
        }

        check_bracket(&request.primary, request.bracket, today, PartyRole::Primary)?;
        if let Some(companion) = &request.companion {
            check_bracket(companion, request.bracket, today, PartyRole::Companion)?;
        }

        let companion_gender = request.companion.as_ref().map(|c| c.gender);
        if self.ratio_permits(snapshot.bracket, request.primary.gender, companion_gender) {
            Ok(Admission::Admit)
        } else {
            Ok(Admission::Waitlist)
        }
    }

    /// Whether admitting a party keeps the bracket's gender balance
    /// within policy.
    ///
    /// The check is skipped while the bracket still has room below the
    /// configured threshold for the whole party. Past that, the party is
    /// hypothetically added and the share of the gender being added to
    /// (decided by the primary registrant) must not strictly exceed the
    /// ceiling. Diverse and unset genders stay out of the denominator.
    #[must_use]
    pub fn ratio_permits(
        &self,
        tally: BracketTally,
        primary: Gender,
        companion: Option<Gender>,
    ) -> bool {
        let party_size = 1 + u32::from(companion.is_some());
        let threshold = self.policy.ratio_threshold.saturating_sub(party_size);
        if tally.total < threshold {
            return true;
        }

        let mut male = u64::from(tally.male);
        let mut female = u64::from(tally.female);
        for gender in std::iter::once(primary).chain(companion) {
            match gender {
                Gender::Male => male += 1,
                Gender::Female => female += 1,
                Gender::Diverse | Gender::Unset => {}
            }
        }

        let counted = male + female;
        if counted == 0 {
            return true;
        }

        let ceiling = u64::from(self.policy.max_gender_share);
        match primary {
            Gender::Male => male * 100 <= counted * ceiling,
            Gender::Female => female * 100 <= counted * ceiling,
            Gender::Diverse | Gender::Unset => true,
        }
    }
}

/// Rejects a party member whose age falls outside the requested bracket
fn check_bracket(
    member: &PartyMember,
    bracket: AgeBracket,
    today: NaiveDate,
    role: PartyRole,
) -> Result<(), AdmissionError> {
    let age = age_on(member.birth_date, today);
    if bracket.contains(age) {
        Ok(())
    } else {
        Err(AdmissionError::AgeBracketMismatch { role, age, bracket })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{EventId, PersonId, PreferenceProfile, VenueAllocation};
    use chrono::Utc;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn member(gender: Gender, birth: NaiveDate) -> PartyMember {
        PartyMember {
            first_name: "Test".to_string(),
            last_name: "Person".to_string(),
            email: format!("{}@example.com", uuid::Uuid::new_v4()),
            gender,
            birth_date: birth,
            has_children: false,
            preferences: PreferenceProfile::default(),
        }
    }

    fn request(gender: Gender, companion: Option<Gender>) -> RegistrationRequest {
        // Ages chosen to sit inside the 31–40 bracket on TODAY
        let birth = date(1990, 1, 1);
        RegistrationRequest {
            event_id: EventId::new(),
            person_id: PersonId::new(),
            bracket: AgeBracket::Thirties,
            primary: member(gender, birth),
            companion: companion.map(|g| member(g, birth)),
        }
    }

    fn snapshot(capacity: u32, registered: u32, tally: BracketTally) -> AdmissionSnapshot {
        AdmissionSnapshot {
            event: Event {
                id: EventId::new(),
                tagline: "Dinner night".to_string(),
                city: "Berlin".to_string(),
                date: date(2025, 9, 20),
                start_time: "19:00".to_string(),
                end_time: "23:00".to_string(),
                venues: vec![VenueAllocation { venue: "Bar A".to_string(), seats: capacity }],
                is_draft: false,
                is_canceled: false,
                capacity_warning_sent: false,
                created_at: Utc::now(),
            },
            registered_count: registered,
            bracket: tally,
            duplicate: false,
        }
    }

    fn tally(male: u32, female: u32) -> BracketTally {
        BracketTally { male, female, total: male + female }
    }

    const TODAY: fn() -> NaiveDate = || date(2025, 6, 1);

    fn evaluator(threshold: u32) -> AdmissionEvaluator {
        AdmissionEvaluator::new(AdmissionPolicy { ratio_threshold: threshold, ..AdmissionPolicy::default() })
    }

    #[test]
    fn full_event_rejects_before_any_other_check() {
        let eval = evaluator(10);
        // Duplicate flag set, but capacity must be reported first
        let mut snap = snapshot(10, 10, tally(5, 5));
        snap.duplicate = true;
        let err = eval.evaluate(&snap, &request(Gender::Male, None), TODAY()).unwrap_err();
        assert!(matches!(err, AdmissionError::CapacityExceeded));
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let eval = evaluator(10);
        let mut snap = snapshot(10, 2, tally(1, 1));
        snap.duplicate = true;
        let err = eval.evaluate(&snap, &request(Gender::Male, None), TODAY()).unwrap_err();
        assert!(matches!(err, AdmissionError::DuplicateRegistration));
    }

    #[test]
    fn draft_event_is_not_open() {
        let eval = evaluator(10);
        let mut snap = snapshot(10, 0, BracketTally::default());
        snap.event.is_draft = true;
        let err = eval.evaluate(&snap, &request(Gender::Male, None), TODAY()).unwrap_err();
        assert!(matches!(err, AdmissionError::EventNotOpen));
    }

    #[test]
    fn primary_outside_bracket_is_rejected() {
        let eval = evaluator(10);
        let snap = snapshot(10, 0, BracketTally::default());
        let mut req = request(Gender::Male, None);
        req.primary.birth_date = date(2000, 1, 1); // age 25, bracket 31–40
        let err = eval.evaluate(&snap, &req, TODAY()).unwrap_err();
        assert!(matches!(
            err,
            AdmissionError::AgeBracketMismatch { role: PartyRole::Primary, age: 25, .. }
        ));
    }

    #[test]
    fn companion_outside_bracket_rejects_the_whole_party() {
        let eval = evaluator(10);
        let snap = snapshot(10, 0, BracketTally::default());
        let mut req = request(Gender::Male, Some(Gender::Female));
        req.companion.as_mut().unwrap().birth_date = date(1970, 1, 1);
        let err = eval.evaluate(&snap, &req, TODAY()).unwrap_err();
        assert!(matches!(
            err,
            AdmissionError::AgeBracketMismatch { role: PartyRole::Companion, .. }
        ));
    }

    #[test]
    fn companion_with_primary_email_conflicts() {
        let eval = evaluator(10);
        let snap = snapshot(10, 0, BracketTally::default());
        let mut req = request(Gender::Male, Some(Gender::Female));
        req.companion.as_mut().unwrap().email = req.primary.email.to_uppercase();
        let err = eval.evaluate(&snap, &req, TODAY()).unwrap_err();
        assert!(matches!(err, AdmissionError::CompanionConflict));
    }

    #[test]
    fn top_bracket_has_no_upper_bound() {
        let eval = evaluator(10);
        let snap = snapshot(10, 0, BracketTally::default());
        let mut req = request(Gender::Male, None);
        req.bracket = AgeBracket::FiftyPlus;
        req.primary.birth_date = date(1950, 1, 1); // age 75
        assert_eq!(eval.evaluate(&snap, &req, TODAY()).unwrap(), Admission::Admit);
    }

    #[test]
    fn ratio_skipped_below_threshold() {
        let eval = evaluator(4);
        // 2 registered < threshold(4) - party(1): heavily male tally still admits
        let snap = snapshot(10, 2, tally(2, 0));
        assert_eq!(
            eval.evaluate(&snap, &request(Gender::Male, None), TODAY()).unwrap(),
            Admission::Admit
        );
    }

    #[test]
    fn companion_party_engages_ratio_one_seat_earlier() {
        let eval = evaluator(4);
        let snap = snapshot(10, 2, tally(2, 0));
        // Party of two: threshold is 4 - 2 = 2, tally.total == 2 engages the
        // check; two more males would make it 4/4 male.
        assert_eq!(
            eval.evaluate(&snap, &request(Gender::Male, Some(Gender::Male)), TODAY()).unwrap(),
            Admission::Waitlist
        );
    }

    #[test]
    fn exceeding_sixty_percent_waitlists() {
        let eval = evaluator(4);
        // 3 male / 2 female registered; one more male = 4/6 = 66.7% > 60%
        let snap = snapshot(20, 5, tally(3, 2));
        assert_eq!(
            eval.evaluate(&snap, &request(Gender::Male, None), TODAY()).unwrap(),
            Admission::Waitlist
        );
    }

    #[test]
    fn exactly_sixty_percent_is_admitted() {
        let eval = evaluator(4);
        // 2 male / 2 female; one more male = 3/5 = 60% exactly
        let snap = snapshot(20, 4, tally(2, 2));
        assert_eq!(
            eval.evaluate(&snap, &request(Gender::Male, None), TODAY()).unwrap(),
            Admission::Admit
        );
    }

    #[test]
    fn diverse_candidates_bypass_the_ratio() {
        let eval = evaluator(2);
        let snap = snapshot(20, 6, tally(6, 0));
        assert_eq!(
            eval.evaluate(&snap, &request(Gender::Diverse, None), TODAY()).unwrap(),
            Admission::Admit
        );
    }

    #[test]
    fn mixed_pair_added_as_single_unit() {
        let eval = evaluator(4);
        // 3 male / 3 female; mixed pair keeps 4/8 = 50% each
        let snap = snapshot(20, 6, tally(3, 3));
        assert_eq!(
            eval.evaluate(&snap, &request(Gender::Male, Some(Gender::Female)), TODAY()).unwrap(),
            Admission::Admit
        );
    }

    proptest! {
        /// Once the threshold is reached, no admitted candidate may push
        /// the share of the gender being added above the ceiling.
        #[test]
        fn admitted_candidates_never_break_the_ratio(
            male in 0u32..30,
            female in 0u32..30,
            primary_is_male in any::<bool>(),
            companion in prop_oneof![
                Just(None),
                Just(Some(Gender::Male)),
                Just(Some(Gender::Female)),
            ],
        ) {
            let eval = evaluator(4);
            let tally = tally(male, female);
            let gender = if primary_is_male { Gender::Male } else { Gender::Female };
            let req = request(gender, companion);

            // Only assert once the check is actually engaged
            prop_assume!(tally.total >= eval.policy().ratio_threshold.saturating_sub(req.party_size()));

            if eval.ratio_permits(tally, req.primary.gender, req.companion.as_ref().map(|c| c.gender)) {
                let mut m = u64::from(male);
                let mut f = u64::from(female);
                match req.primary.gender {
                    Gender::Male => m += 1,
                    Gender::Female => f += 1,
                    _ => {}
                }
                if let Some(c) = &req.companion {
                    match c.gender {
                        Gender::Male => m += 1,
                        Gender::Female => f += 1,
                        _ => {}
                    }
                }
                let counted = m + f;
                let added = match req.primary.gender {
                    Gender::Male => m,
                    Gender::Female => f,
                    _ => 0,
                };
                prop_assert!(added * 100 <= counted * 60);
            }
        }
    }
}
