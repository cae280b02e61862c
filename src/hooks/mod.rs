//! Harness-facing lifecycle hooks.
//!
//! The load-generation engine calls these at fixed points of a virtual
//! user's request lifecycle: a before-request hook fills the request-scoped
//! variable bag, an after-response hook records created entities, and the
//! decide/continue hooks drive scripted loops. Returning from a hook is the
//! continuation; hooks never panic across the harness boundary. Anything
//! that goes wrong internally is logged and the hook degrades to a no-op.

use std::collections::HashMap;
use std::path::Path;

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::Value;
use tracing::{debug, warn};

use crate::generators::{self, DecisionPolicy, GeneratorConfig};
use crate::models::{House, Question, Rental, User};
use crate::sampling::{chance, sample_skewed, sample_uniform};
use crate::store::{EntityStore, ImagePool, PersistMode};

const USERS_FILE: &str = "users.data";
const HOUSES_FILE: &str = "houses.data";
const QUESTIONS_FILE: &str = "questions.data";
const RENTALS_FILE: &str = "rentals.data";

/// The entity kinds a virtual user can create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    User,
    House,
    Question,
    Rental,
}

/// Request-scoped variable bag consumed by the harness templates.
///
/// Generators delete stale variables instead of leaving them behind, so a
/// missing prerequisite shows up as an absent key, never as a null.
#[derive(Debug, Default)]
pub struct Context {
    vars: HashMap<String, Value>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.vars.insert(key.to_string(), value.into());
    }

    pub fn remove(&mut self, key: &str) {
        self.vars.remove(key);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.vars.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.vars.get(key).and_then(Value::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }
}

/// Mutable request parameters handed to body-setting hooks.
#[derive(Debug, Default)]
pub struct RequestParams {
    pub body: Option<Vec<u8>>,
}

/// First choice of `decide_next_action`.
#[derive(Debug, Clone, PartialEq)]
pub enum BrowseMode {
    /// Browse the discounted listings.
    Discounted,
    /// Browse by location and availability window.
    ByLocationAndDate {
        location: String,
        init_date: NaiveDate,
        end_date: NaiveDate,
    },
}

/// Second choice of `decide_next_action`.
#[derive(Debug, Clone, PartialEq)]
pub enum AfterAction {
    Browse,
    CheckQuestions,
    PostQuestion { text: String },
    Reserve,
    Idle,
}

/// Outcome of `decide_next_action`; also mirrored into context vars for
/// harness templates that branch on `nextAction`/`afterNextAction`.
#[derive(Debug, Clone, PartialEq)]
pub struct NextAction {
    pub browse: BrowseMode,
    pub after: AfterAction,
}

/// Owns the per-process scenario state: one store per entity kind, the
/// image pool, the generator knobs and the RNG.
///
/// Virtual users share this mutably with no internal locking, exactly like
/// the scenario scripts this replaces shared their module-level arrays. A
/// harness that interleaves hooks cooperatively can use it as-is; one that
/// runs hooks on several threads must provide its own synchronization.
pub struct ScenarioHooks {
    users: EntityStore<User>,
    houses: EntityStore<House>,
    questions: EntityStore<Question>,
    rentals: EntityStore<Rental>,
    images: ImagePool,
    cfg: GeneratorConfig,
    rng: StdRng,
}

impl ScenarioHooks {
    /// Load all entity stores from `data_dir` (one file per kind) with an
    /// entropy-seeded RNG and an empty image pool.
    pub fn load(data_dir: &Path, cfg: GeneratorConfig, mode: PersistMode) -> Self {
        Self::with_rng(data_dir, cfg, mode, StdRng::from_entropy())
    }

    /// Same as [`load`](Self::load) but with a caller-provided RNG, for
    /// deterministic runs and tests.
    pub fn with_rng(data_dir: &Path, cfg: GeneratorConfig, mode: PersistMode, rng: StdRng) -> Self {
        Self {
            users: EntityStore::load(data_dir.join(USERS_FILE), mode),
            houses: EntityStore::load(data_dir.join(HOUSES_FILE), mode),
            questions: EntityStore::load(data_dir.join(QUESTIONS_FILE), mode),
            rentals: EntityStore::load(data_dir.join(RENTALS_FILE), mode),
            images: ImagePool::empty(),
            cfg,
            rng,
        }
    }

    /// Load the static image pool used by media upload hooks.
    pub fn load_images(&mut self, dir: &Path, count: usize) {
        self.images = ImagePool::load(dir, count);
    }

    pub fn users(&self) -> &EntityStore<User> {
        &self.users
    }

    pub fn houses(&self) -> &EntityStore<House> {
        &self.houses
    }

    pub fn questions(&self) -> &EntityStore<Question> {
        &self.questions
    }

    pub fn rentals(&self) -> &EntityStore<Rental> {
        &self.rentals
    }

    /// Before-request hook: generate a payload for `kind` and write its
    /// fields into the context vars. Fields depending on an empty
    /// prerequisite collection are removed from the bag instead of set.
    pub fn before_request(&mut self, kind: EntityKind, ctx: &mut Context) {
        match kind {
            EntityKind::User => {
                let user = generators::new_user(&mut self.rng);
                ctx.set("id", user.id);
                ctx.set("name", user.name);
                ctx.set("pwd", user.pwd);
            }
            EntityKind::House => {
                let house = generators::new_house(&mut self.rng, self.users.items(), &self.cfg);
                ctx.set("id", house.id);
                ctx.set("name", house.name);
                ctx.set("location", house.location);
                ctx.set("description", house.description);
                ctx.set("price", house.price);
                ctx.set("discount", house.discount);
                match house.owner_id {
                    Some(owner) => ctx.set("ownerId", owner),
                    None => {
                        debug!("no users recorded yet, omitting ownerId");
                        ctx.remove("ownerId");
                    }
                }
            }
            EntityKind::Question => {
                match generators::new_question(&mut self.rng, self.houses.items(), self.users.items())
                {
                    Some(q) => {
                        ctx.set("houseId", q.house_id);
                        ctx.set("askerId", q.asker_id);
                        ctx.set("text", q.text);
                    }
                    None => {
                        debug!("missing houses or users, skipping question payload");
                        ctx.remove("houseId");
                        ctx.remove("askerId");
                        ctx.remove("text");
                    }
                }
            }
            EntityKind::Rental => {
                match generators::new_rental(
                    &mut self.rng,
                    self.houses.items(),
                    self.users.items(),
                    self.cfg.rental_dates,
                ) {
                    Some(r) => {
                        ctx.set("houseId", r.house_id);
                        ctx.set("userId", r.user_id);
                        ctx.set("initialDate", r.initial_date.to_string());
                        ctx.set("endDate", r.end_date.to_string());
                    }
                    None => {
                        debug!("missing houses or users, skipping rental payload");
                        ctx.remove("houseId");
                        ctx.remove("userId");
                        ctx.remove("initialDate");
                        ctx.remove("endDate");
                    }
                }
            }
        }
    }

    /// Set the request body to a randomly chosen image from the pool.
    pub fn upload_image_body(&mut self, params: &mut RequestParams) {
        match self.images.sample(&mut self.rng) {
            Some(bytes) => params.body = Some(bytes.to_vec()),
            None => {
                warn!("image pool is empty, sending no body");
                params.body = None;
            }
        }
    }

    /// After-response hook: record the created entity when the request
    /// succeeded, otherwise log and do nothing. Never fails the caller.
    pub fn after_response(&mut self, kind: EntityKind, status: u16, body: &str) {
        match kind {
            EntityKind::User => self.users.record_on_success(status, body),
            EntityKind::House => self.houses.record_on_success(status, body),
            EntityKind::Question => self.questions.record_on_success(status, body),
            EntityKind::Rental => self.rentals.record_on_success(status, body),
        };
    }

    /// Put a uniformly sampled known user (and its password) into the vars,
    /// or clear them when none exist yet.
    pub fn select_user(&mut self, ctx: &mut Context) {
        match sample_uniform(&mut self.rng, self.users.items()) {
            Some(user) => {
                let id = user.id.clone();
                ctx.set("user", id.clone());
                ctx.set("pwd", id);
            }
            None => {
                ctx.remove("user");
                ctx.remove("pwd");
            }
        }
    }

    /// Like [`select_user`](Self::select_user) but biased toward the oldest
    /// recorded users, simulating a popular recurring pool.
    pub fn select_user_skewed(&mut self, ctx: &mut Context) {
        match sample_skewed(&mut self.rng, self.users.items()) {
            Some(user) => {
                let id = user.id.clone();
                ctx.set("user", id.clone());
                ctx.set("pwd", id);
            }
            None => {
                ctx.remove("user");
                ctx.remove("pwd");
            }
        }
    }

    /// Pick a house from the `housesLst` var (a list carried over from a
    /// previous browse response) and expose its id and owner. Requires a
    /// logged-in `user` var; clears `houseId` when anything is missing.
    pub fn select_house(&mut self, ctx: &mut Context) {
        ctx.remove("value");
        let houses = match (ctx.contains("user"), ctx.get("housesLst").and_then(Value::as_array))
        {
            (true, Some(list)) if !list.is_empty() => list.clone(),
            _ => {
                ctx.remove("houseId");
                return;
            }
        };
        if let Some(house) = sample_uniform(&mut self.rng, &houses) {
            let id = house.get("id").and_then(Value::as_str).unwrap_or_default().to_string();
            let owner = house
                .get("ownerId")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            ctx.set("houseId", id);
            ctx.set("owner", owner);
        }
    }

    /// Pick a question from the `questionLst` var and prepare a reply for
    /// it. Clears `questionId` when anything is missing.
    pub fn select_question(&mut self, ctx: &mut Context) {
        ctx.remove("value");
        let questions =
            match (ctx.contains("user"), ctx.get("questionLst").and_then(Value::as_array)) {
                (true, Some(list)) if !list.is_empty() => list.clone(),
                _ => {
                    ctx.remove("questionId");
                    return;
                }
            };
        if let Some(question) = sample_uniform(&mut self.rng, &questions) {
            let id =
                question.get("id").and_then(Value::as_str).unwrap_or_default().to_string();
            let owner = question
                .get("askerId")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let house_id = question
                .get("houseId")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            ctx.set("questionId", id);
            ctx.set("owner", owner);
            ctx.set("houseId", house_id);
            ctx.set("reply", generators::question_text(&mut self.rng));
        }
    }

    /// Put a random location from the configured pool into the vars.
    pub fn select_location(&mut self, ctx: &mut Context) {
        if let Some(location) = sample_uniform(&mut self.rng, &self.cfg.locations) {
            ctx.set("location", location.clone());
        }
    }

    /// Weighted choice of what this virtual user does next: browse the
    /// discounted listings (10%) or browse by location and date (90%),
    /// followed by browse / check questions / post a question / reserve /
    /// idle with cumulative weights 0.30 / 0.40 / 0.45 / 0.60 / rest.
    ///
    /// Under `DecisionPolicy::CoupledDraw` both choices branch on one
    /// shared uniform value, like the original scripts, which ties them
    /// together (a discounted browse is always followed by more browsing).
    /// `DecisionPolicy::IndependentDraws` breaks that tie and only keeps
    /// the marginal weights.
    pub fn decide_next_action(&mut self, ctx: &mut Context) -> NextAction {
        ctx.remove("auctionId");
        let first: f64 = self.rng.gen();
        let second = match self.cfg.decision {
            DecisionPolicy::CoupledDraw => first,
            DecisionPolicy::IndependentDraws => self.rng.gen(),
        };

        let browse = if first < 0.1 {
            ctx.set("nextAction", 0);
            BrowseMode::Discounted
        } else {
            let location = sample_uniform(&mut self.rng, &self.cfg.locations)
                .cloned()
                .unwrap_or_else(|| "Lisbon".to_string());
            let (init_date, end_date) =
                generators::rental_dates(&mut self.rng, self.cfg.rental_dates);
            ctx.set("nextAction", 1);
            ctx.set("location", location.clone());
            ctx.set("initDate", init_date.to_string());
            ctx.set("endDate", end_date.to_string());
            BrowseMode::ByLocationAndDate { location, init_date, end_date }
        };

        let after = if second < 0.30 {
            ctx.set("afterNextAction", 0);
            AfterAction::Browse
        } else if second < 0.40 {
            ctx.set("afterNextAction", 1);
            AfterAction::CheckQuestions
        } else if second < 0.45 {
            let text = generators::question_text(&mut self.rng);
            ctx.set("afterNextAction", 2);
            ctx.set("text", text.clone());
            AfterAction::PostQuestion { text }
        } else if second < 0.60 {
            ctx.set("afterNextAction", 3);
            AfterAction::Reserve
        } else {
            ctx.set("afterNextAction", 4);
            AfterAction::Idle
        };

        NextAction { browse, after }
    }

    /// Loop-continuation coin: true with probability `p`.
    pub fn continue_looping(&mut self, p: f64) -> bool {
        chance(&mut self.rng, p)
    }
}
