use chrono::{Duration, NaiveDate, Utc};
use fake::faker::address::en::StreetName;
use fake::faker::lorem::en::{Sentence, Words};
use fake::faker::name::en::{FirstName, LastName};
use fake::Fake;
use rand::Rng;

use crate::models::{House, HousePayload, QuestionPayload, RentalPayload, User, UserPayload};
use crate::sampling::{chance, random_below, sample_uniform};

const QUESTION_WORDS: [&str; 6] = ["What", "When", "Where", "Who", "Why", "How"];

/// How a generated house discount is derived. The deployed scenario scripts
/// disagreed on this, so both observed policies are kept selectable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DiscountPolicy {
    /// Zero, except a 1-in-20 draw yields a multiple of ten (0..=40).
    TensLottery,
    /// Zero unless an independent uniform draw exceeds `threshold`, then a
    /// tenth of the price. "Probably zero, occasionally meaningful."
    PriceFraction { threshold: f64 },
}

/// How rental date ranges are drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RentalDatePolicy {
    /// Initial date between today and `until`; stay length is bimodal,
    /// mostly 1-15 days with an occasional 16-30 day stay.
    FutureWindow { until: NaiveDate },
    /// Initial date within the past year, end date between it and today.
    PastToNow,
}

/// Whether `decide_next_action` reproduces the legacy coupled single draw
/// or uses two independent ones. See `hooks::ScenarioHooks::decide_next_action`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionPolicy {
    /// One uniform value drives both the browse-mode choice and the
    /// follow-up action choice, exactly like the original scripts. Needed
    /// for parity with recorded traces.
    CoupledDraw,
    /// Each choice gets its own draw; only the marginal weights match.
    IndependentDraws,
}

/// Bounded half-open price range for generated houses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceRange {
    pub min: i64,
    pub max: i64,
}

/// Knobs covering the variations observed across the scenario scripts.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub locations: Vec<String>,
    pub price: PriceRange,
    pub discount: DiscountPolicy,
    pub rental_dates: RentalDatePolicy,
    pub decision: DecisionPolicy,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            locations: [
                "Lisbon", "Porto", "Madeira", "Azores", "Algarve", "Braga", "Coimbra",
                "Evora", "Aveiro", "Leiria",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            price: PriceRange { min: 200, max: 700 },
            discount: DiscountPolicy::TensLottery,
            rental_dates: RentalDatePolicy::FutureWindow {
                until: Utc::now().date_naive() + Duration::days(365),
            },
            decision: DecisionPolicy::CoupledDraw,
        }
    }
}

/// Generate a new user payload. The id is the "First.Last" natural key and
/// also serves as the password, matching what the target API seeds expect.
pub fn new_user<R: Rng + ?Sized>(rng: &mut R) -> UserPayload {
    let first: String = FirstName().fake_with_rng(rng);
    let last: String = LastName().fake_with_rng(rng);
    let id = format!("{first}.{last}");
    UserPayload { name: format!("{first} {last}"), pwd: id.clone(), id }
}

/// Generate a new house payload. The owner is sampled from the known users;
/// when none have been recorded yet the field is omitted entirely rather
/// than filled with a dangling reference.
pub fn new_house<R: Rng + ?Sized>(
    rng: &mut R,
    users: &[User],
    cfg: &GeneratorConfig,
) -> HousePayload {
    let street: String = StreetName().fake_with_rng(rng);
    let location = sample_uniform(rng, &cfg.locations)
        .cloned()
        .unwrap_or_else(|| "Lisbon".to_string());
    let description: String = Sentence(3..8).fake_with_rng(rng);
    let span = (cfg.price.max - cfg.price.min).max(1) as u64;
    let price = cfg.price.min + random_below(rng, span) as i64;
    let discount = roll_discount(rng, price, cfg.discount);
    let owner_id = sample_uniform(rng, users).map(|u| u.id.clone());
    HousePayload {
        id: street.clone(),
        name: street,
        location,
        description,
        owner_id,
        price,
        discount,
    }
}

fn roll_discount<R: Rng + ?Sized>(rng: &mut R, price: i64, policy: DiscountPolicy) -> i64 {
    match policy {
        DiscountPolicy::TensLottery => {
            if random_below(rng, 20) == 0 {
                random_below(rng, 5) as i64 * 10
            } else {
                0
            }
        }
        DiscountPolicy::PriceFraction { threshold } => {
            if rng.gen::<f64>() > threshold {
                price / 10
            } else {
                0
            }
        }
    }
}

/// Generate a question about an existing house from an existing user, or
/// `None` when either prerequisite collection is still empty.
pub fn new_question<R: Rng + ?Sized>(
    rng: &mut R,
    houses: &[House],
    users: &[User],
) -> Option<QuestionPayload> {
    let house = sample_uniform(rng, houses)?;
    let asker = sample_uniform(rng, users)?;
    Some(QuestionPayload {
        house_id: house.id.clone(),
        asker_id: asker.id.clone(),
        text: question_text(rng),
    })
}

/// `<QuestionWord> is <random phrase> <random phrase>?`
pub fn question_text<R: Rng + ?Sized>(rng: &mut R) -> String {
    let word = QUESTION_WORDS[random_below(rng, QUESTION_WORDS.len() as u64) as usize];
    let subject: Vec<String> = Words(1..4).fake_with_rng(rng);
    let action: Vec<String> = Words(1..4).fake_with_rng(rng);
    format!("{word} is {} {}?", subject.join(" "), action.join(" "))
}

/// Generate a reservation for an existing house by an existing user, or
/// `None` when either prerequisite collection is still empty.
pub fn new_rental<R: Rng + ?Sized>(
    rng: &mut R,
    houses: &[House],
    users: &[User],
    policy: RentalDatePolicy,
) -> Option<RentalPayload> {
    let house = sample_uniform(rng, houses)?;
    let user = sample_uniform(rng, users)?;
    let (initial_date, end_date) = rental_dates(rng, policy);
    Some(RentalPayload {
        house_id: house.id.clone(),
        user_id: user.id.clone(),
        initial_date,
        end_date,
    })
}

/// Draw a date range with `initial <= end` under the given policy.
pub fn rental_dates<R: Rng + ?Sized>(rng: &mut R, policy: RentalDatePolicy) -> (NaiveDate, NaiveDate) {
    let today = Utc::now().date_naive();
    match policy {
        RentalDatePolicy::FutureWindow { until } => {
            let window = (until - today).num_days().max(0) as u64;
            let initial = today + Duration::days(random_below(rng, window + 1) as i64);
            let end = initial + Duration::days(stay_length(rng));
            (initial, end)
        }
        RentalDatePolicy::PastToNow => {
            let initial = today - Duration::days(random_below(rng, 365) as i64 + 1);
            let span = (today - initial).num_days() as u64;
            let end = initial + Duration::days(random_below(rng, span + 1) as i64);
            (initial, end)
        }
    }
}

// Mostly short stays, occasionally a long one.
fn stay_length<R: Rng + ?Sized>(rng: &mut R) -> i64 {
    if chance(rng, 0.15) {
        16 + random_below(rng, 15) as i64
    } else {
        1 + random_below(rng, 15) as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn seeded_user(id: &str) -> User {
        User { id: id.into(), name: id.replace('.', " "), pwd: id.into() }
    }

    fn seeded_house(id: &str) -> House {
        House {
            id: id.into(),
            name: id.into(),
            location: "Lisbon".into(),
            description: "by the river".into(),
            owner_id: "Ana.Silva".into(),
            price: 300,
            discount: 0,
        }
    }

    #[test]
    fn user_id_is_first_dot_last() {
        let mut rng = StdRng::seed_from_u64(1);
        let user = new_user(&mut rng);
        assert!(user.id.contains('.'));
        assert_eq!(user.pwd, user.id);
        assert_eq!(user.name, user.id.replace('.', " "));
    }

    #[test]
    fn house_without_users_omits_owner() {
        let mut rng = StdRng::seed_from_u64(2);
        let cfg = GeneratorConfig::default();
        let house = new_house(&mut rng, &[], &cfg);
        assert!(house.owner_id.is_none());
        let json = serde_json::to_value(&house).unwrap();
        assert!(json.get("ownerId").is_none());
    }

    #[test]
    fn house_owner_always_a_known_user() {
        let mut rng = StdRng::seed_from_u64(3);
        let cfg = GeneratorConfig::default();
        let users = vec![seeded_user("Ana.Silva")];
        for _ in 0..100 {
            let house = new_house(&mut rng, &users, &cfg);
            assert_eq!(house.owner_id.as_deref(), Some("Ana.Silva"));
        }
    }

    #[test]
    fn house_price_within_configured_range() {
        let mut rng = StdRng::seed_from_u64(4);
        let cfg = GeneratorConfig {
            price: PriceRange { min: 0, max: 300 },
            ..GeneratorConfig::default()
        };
        for _ in 0..500 {
            let house = new_house(&mut rng, &[], &cfg);
            assert!((0..300).contains(&house.price));
        }
    }

    #[test]
    fn tens_lottery_discount_is_a_small_multiple_of_ten() {
        let mut rng = StdRng::seed_from_u64(5);
        let cfg = GeneratorConfig::default();
        for _ in 0..2000 {
            let house = new_house(&mut rng, &[], &cfg);
            assert_eq!(house.discount % 10, 0);
            assert!(house.discount <= 40);
        }
    }

    #[test]
    fn price_fraction_discount_is_usually_zero() {
        let mut rng = StdRng::seed_from_u64(6);
        let cfg = GeneratorConfig {
            discount: DiscountPolicy::PriceFraction { threshold: 0.85 },
            ..GeneratorConfig::default()
        };
        let mut nonzero = 0;
        for _ in 0..2000 {
            let house = new_house(&mut rng, &[], &cfg);
            if house.discount > 0 {
                nonzero += 1;
                assert_eq!(house.discount, house.price / 10);
            }
        }
        // ~15% expected; 5%..25% leaves generous slack for the seed
        assert!((100..500).contains(&nonzero), "nonzero discounts: {nonzero}");
    }

    #[test]
    fn question_requires_house_and_user() {
        let mut rng = StdRng::seed_from_u64(7);
        assert!(new_question(&mut rng, &[], &[seeded_user("A.B")]).is_none());
        assert!(new_question(&mut rng, &[seeded_house("Elm Street")], &[]).is_none());

        let q = new_question(
            &mut rng,
            &[seeded_house("Elm Street")],
            &[seeded_user("Ana.Silva")],
        )
        .unwrap();
        assert_eq!(q.house_id, "Elm Street");
        assert_eq!(q.asker_id, "Ana.Silva");
    }

    #[test]
    fn question_text_is_templated() {
        let mut rng = StdRng::seed_from_u64(8);
        for _ in 0..200 {
            let text = question_text(&mut rng);
            assert!(text.ends_with('?'));
            let word = text.split(' ').next().unwrap();
            assert!(QUESTION_WORDS.contains(&word), "bad question word in {text:?}");
            assert!(text.contains(" is "));
        }
    }

    #[test]
    fn rental_dates_are_ordered_future_window() {
        let mut rng = StdRng::seed_from_u64(9);
        let until = Utc::now().date_naive() + Duration::days(400);
        for _ in 0..1000 {
            let (initial, end) = rental_dates(&mut rng, RentalDatePolicy::FutureWindow { until });
            assert!(initial <= end);
            assert!(initial >= Utc::now().date_naive());
            let stay = (end - initial).num_days();
            assert!((1..=30).contains(&stay));
        }
    }

    #[test]
    fn rental_dates_are_ordered_past_to_now() {
        let mut rng = StdRng::seed_from_u64(10);
        let today = Utc::now().date_naive();
        for _ in 0..1000 {
            let (initial, end) = rental_dates(&mut rng, RentalDatePolicy::PastToNow);
            assert!(initial <= end);
            assert!(initial < today);
            assert!(end <= today);
        }
    }

    #[test]
    fn rental_requires_house_and_user() {
        let mut rng = StdRng::seed_from_u64(11);
        let policy = RentalDatePolicy::PastToNow;
        assert!(new_rental(&mut rng, &[], &[seeded_user("A.B")], policy).is_none());
        let rental = new_rental(
            &mut rng,
            &[seeded_house("Elm Street")],
            &[seeded_user("Ana.Silva")],
            policy,
        )
        .unwrap();
        assert_eq!(rental.house_id, "Elm Street");
        assert_eq!(rental.user_id, "Ana.Silva");
    }
}
