//! # Recipe Resolution Controller
//!
//! Turns a seed recipe or a confirmed ingredient list into AI-generated
//! candidates and tracks the user's way through them.
//!
//! ## State Machine
//!
//! ```text
//!            begin                 success (>= 1 recipe)
//!   Idle ───────────► Generating ───────────────────────► CandidatesReady
//!    ▲                   │   ▲                                │      ▲
//!    │ dismiss           │   │ retry                  select  │      │ leave_detail
//!    │                   ▼   │                                ▼      │
//!    └──────────────── Error ◄── failure / empty          DetailReady
//! ```
//!
//! - Only one request is in flight; beginning another while `Generating`
//!   fails with [`ResolutionError::RequestInFlight`].
//! - `Error` keeps the exact request that failed so `retry` resubmits it.
//!   Constraints are rebuilt from the profile store on every attempt.
//! - Each request gets a [`GenerationToken`]. A completion whose token no
//!   longer matches (the user abandoned the flow) is dropped as
//!   [`Completion::Stale`].

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

use crate::generation::{GenerationConstraints, GenerationError, GenerationResponse, RecipeGenerator};
use crate::localization::t_lang;
use crate::recipe_model::{Category, Provenance, Recipe, SeedRecipe};
use crate::user_profile::{ProfileStore, UserProfile};

/// Servings requested when the caller has no preference
pub const DEFAULT_REQUEST_SERVINGS: u32 = 2;

/// Generation primed by a catalog seed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedRequest {
    pub seed: SeedRecipe,
    pub servings: u32,
}

/// Generation from a captured ingredient list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientListRequest {
    pub ingredients: Vec<String>,
    pub servings: u32,
    #[serde(default)]
    pub preferred_categories: Vec<Category>,
    #[serde(default)]
    pub free_text: Option<String>,
}

/// The input of a generation, kept verbatim for retry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GenerationRequest {
    Seed(SeedRequest),
    IngredientList(IngredientListRequest),
}

impl GenerationRequest {
    /// Seed request at the seed's own serving count
    pub fn from_seed(seed: &SeedRecipe) -> Self {
        GenerationRequest::Seed(SeedRequest {
            seed: seed.clone(),
            servings: seed.servings.max(1),
        })
    }

    /// Ingredient-list request with default servings and no preferences
    pub fn from_ingredients(ingredients: Vec<String>) -> Self {
        GenerationRequest::IngredientList(IngredientListRequest {
            ingredients,
            servings: DEFAULT_REQUEST_SERVINGS,
            preferred_categories: Vec::new(),
            free_text: None,
        })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            GenerationRequest::Seed(_) => "seed",
            GenerationRequest::IngredientList(_) => "ingredient_list",
        }
    }

    /// Ingredient names sent to the service
    pub fn ingredients(&self) -> &[String] {
        match self {
            GenerationRequest::Seed(request) => &request.seed.seed_ingredients,
            GenerationRequest::IngredientList(request) => &request.ingredients,
        }
    }

    /// Constraint payload for this request under the given profile
    pub fn constraints(&self, profile: &UserProfile) -> GenerationConstraints {
        match self {
            GenerationRequest::Seed(request) => GenerationConstraints::from_profile(
                profile,
                request.servings,
                vec![request.seed.category],
                Some(request.seed.prompt_description()),
            ),
            GenerationRequest::IngredientList(request) => GenerationConstraints::from_profile(
                profile,
                request.servings,
                request.preferred_categories.clone(),
                request.free_text.clone(),
            ),
        }
    }
}

/// Screen the user started a flow from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Screen {
    #[default]
    Home,
    CategoryList(Category),
    Capture,
    Candidates,
}

/// Identifies one generation attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GenerationToken(u64);

impl fmt::Display for GenerationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Work handed to the caller by [`RecipeResolutionController::begin`]
#[derive(Debug, Clone, PartialEq)]
pub struct PendingGeneration {
    pub token: GenerationToken,
    pub ingredients: Vec<String>,
    pub constraints: GenerationConstraints,
}

/// Controller state
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ResolutionState {
    #[default]
    Idle,
    Generating {
        request: GenerationRequest,
        token: GenerationToken,
    },
    CandidatesReady {
        request: GenerationRequest,
        candidates: Vec<Recipe>,
    },
    DetailReady {
        recipe: Recipe,
        /// Candidate list to return to; empty when opened directly
        candidates: Vec<Recipe>,
        request: Option<GenerationRequest>,
    },
    Error {
        request: GenerationRequest,
        message: String,
        cause: String,
    },
}

impl ResolutionState {
    pub fn name(&self) -> &'static str {
        match self {
            ResolutionState::Idle => "idle",
            ResolutionState::Generating { .. } => "generating",
            ResolutionState::CandidatesReady { .. } => "candidates-ready",
            ResolutionState::DetailReady { .. } => "detail-ready",
            ResolutionState::Error { .. } => "error",
        }
    }

    pub fn is_generating(&self) -> bool {
        matches!(self, ResolutionState::Generating { .. })
    }
}

/// Whether a completion changed the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    Stale,
}

/// Transitions the current state does not allow
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    /// A generation is already outstanding
    RequestInFlight,
    /// Retry requested outside the error state
    NothingToRetry,
    /// An ingredient-list request without ingredients
    EmptyIngredientList,
    /// Candidate selection outside the candidate list
    NoCandidates,
    CandidateOutOfRange { index: usize, len: usize },
    /// Leave-detail requested outside the detail view
    NotInDetail,
}

impl fmt::Display for ResolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionError::RequestInFlight => write!(f, "A recipe generation is already in progress"),
            ResolutionError::NothingToRetry => write!(f, "There is no failed request to retry"),
            ResolutionError::EmptyIngredientList => write!(f, "The ingredient list is empty"),
            ResolutionError::NoCandidates => write!(f, "No candidate list is showing"),
            ResolutionError::CandidateOutOfRange { index, len } => {
                write!(f, "Candidate {index} is out of range (have {len})")
            }
            ResolutionError::NotInDetail => write!(f, "No recipe detail is showing"),
        }
    }
}

impl std::error::Error for ResolutionError {}

/// Drives generation requests and candidate/detail navigation
#[derive(Debug)]
pub struct RecipeResolutionController<S: ProfileStore> {
    store: S,
    state: ResolutionState,
    origin: Screen,
    next_token: u64,
}

impl<S: ProfileStore> RecipeResolutionController<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            state: ResolutionState::Idle,
            origin: Screen::Home,
            next_token: 1,
        }
    }

    pub fn state(&self) -> &ResolutionState {
        &self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Screen the current flow started from
    pub fn origin(&self) -> Screen {
        self.origin
    }

    pub fn candidates(&self) -> &[Recipe] {
        match &self.state {
            ResolutionState::CandidatesReady { candidates, .. } => candidates,
            _ => &[],
        }
    }

    pub fn selected(&self) -> Option<&Recipe> {
        match &self.state {
            ResolutionState::DetailReady { recipe, .. } => Some(recipe),
            _ => None,
        }
    }

    fn current_profile(&self) -> UserProfile {
        self.store.load().unwrap_or_default()
    }

    /// Enter `Generating` for `request` and hand back what to send
    pub fn begin(
        &mut self,
        request: GenerationRequest,
        origin: Screen,
    ) -> Result<PendingGeneration, ResolutionError> {
        if self.state.is_generating() {
            warn!(request_kind = request.kind(), "Refusing to start a second generation");
            return Err(ResolutionError::RequestInFlight);
        }
        if matches!(request, GenerationRequest::IngredientList(_)) && request.ingredients().is_empty() {
            return Err(ResolutionError::EmptyIngredientList);
        }

        self.origin = origin;
        Ok(self.start(request))
    }

    fn start(&mut self, request: GenerationRequest) -> PendingGeneration {
        let token = GenerationToken(self.next_token);
        self.next_token += 1;

        let profile = self.current_profile();
        let pending = PendingGeneration {
            token,
            ingredients: request.ingredients().to_vec(),
            constraints: request.constraints(&profile),
        };

        info!(
            request_kind = request.kind(),
            %token,
            ingredients = pending.ingredients.len(),
            servings = pending.constraints.servings,
            "Generation started"
        );
        self.state = ResolutionState::Generating { request, token };
        pending
    }

    /// Re-enter `Generating` with the request stored in the error state
    pub fn begin_retry(&mut self) -> Result<PendingGeneration, ResolutionError> {
        let request = match &self.state {
            ResolutionState::Error { request, .. } => request.clone(),
            ResolutionState::Generating { .. } => return Err(ResolutionError::RequestInFlight),
            _ => return Err(ResolutionError::NothingToRetry),
        };
        info!(request_kind = request.kind(), "Retrying failed generation");
        Ok(self.start(request))
    }

    /// Apply the outcome of the generation identified by `token`
    pub fn complete(
        &mut self,
        token: GenerationToken,
        outcome: Result<GenerationResponse, GenerationError>,
    ) -> Completion {
        let request = match &self.state {
            ResolutionState::Generating { token: current, request } if *current == token => {
                request.clone()
            }
            _ => {
                debug!(%token, state = self.state.name(), "Discarding stale generation result");
                return Completion::Stale;
            }
        };

        let outcome = outcome.and_then(|response| {
            if response.recipes.is_empty() {
                Err(GenerationError::EmptyResult)
            } else {
                Ok(response.recipes)
            }
        });

        self.state = match outcome {
            Ok(recipes) => {
                let candidates = tag_candidates(recipes, &request, token);
                info!(%token, candidates = candidates.len(), "Generation produced candidates");
                ResolutionState::CandidatesReady { request, candidates }
            }
            Err(e) => {
                let language = self.current_profile().language;
                let key = match e {
                    GenerationError::EmptyResult => "generation-empty",
                    GenerationError::CircuitOpen => "generation-unavailable",
                    _ => "generation-failed",
                };
                warn!(%token, error = %e, request_kind = request.kind(), "Generation failed");
                ResolutionState::Error {
                    request,
                    message: t_lang(key, &language),
                    cause: e.to_string(),
                }
            }
        };

        Completion::Applied
    }

    /// Begin, call the generator and apply its outcome
    pub async fn submit<G: RecipeGenerator + ?Sized>(
        &mut self,
        generator: &G,
        request: GenerationRequest,
        origin: Screen,
    ) -> Result<&ResolutionState, ResolutionError> {
        let pending = self.begin(request, origin)?;
        self.run(generator, pending).await;
        Ok(&self.state)
    }

    /// Resubmit the failed request through the generator
    pub async fn retry<G: RecipeGenerator + ?Sized>(
        &mut self,
        generator: &G,
    ) -> Result<&ResolutionState, ResolutionError> {
        let pending = self.begin_retry()?;
        self.run(generator, pending).await;
        Ok(&self.state)
    }

    async fn run<G: RecipeGenerator + ?Sized>(&mut self, generator: &G, pending: PendingGeneration) {
        let outcome = generator
            .generate(&pending.ingredients, &pending.constraints)
            .await;
        self.complete(pending.token, outcome);
    }

    /// Drop the error and go back to where the flow started
    pub fn dismiss(&mut self) -> Screen {
        if matches!(self.state, ResolutionState::Error { .. }) {
            debug!("Error dismissed");
            self.state = ResolutionState::Idle;
        }
        self.origin
    }

    /// Leave a running generation; its late result will be discarded
    pub fn abandon(&mut self) -> Screen {
        if let ResolutionState::Generating { token, .. } = &self.state {
            info!(token = %token, "Generation abandoned");
            self.state = ResolutionState::Idle;
        }
        self.origin
    }

    /// Open candidate `index` in the detail view
    pub fn select_candidate(&mut self, index: usize) -> Result<&Recipe, ResolutionError> {
        let ResolutionState::CandidatesReady { candidates, request } = &self.state else {
            return Err(ResolutionError::NoCandidates);
        };
        if index >= candidates.len() {
            return Err(ResolutionError::CandidateOutOfRange {
                index,
                len: candidates.len(),
            });
        }

        let recipe = candidates[index].clone();
        debug!(recipe_id = %recipe.recipe_id, index, "Candidate selected");
        self.state = ResolutionState::DetailReady {
            recipe,
            candidates: candidates.clone(),
            request: Some(request.clone()),
        };

        match &self.state {
            ResolutionState::DetailReady { recipe, .. } => Ok(recipe),
            _ => Err(ResolutionError::NoCandidates),
        }
    }

    /// Show a recipe that needs no generation, e.g. from a browse card
    pub fn open_recipe(&mut self, recipe: Recipe, origin: Screen) -> Result<(), ResolutionError> {
        if self.state.is_generating() {
            return Err(ResolutionError::RequestInFlight);
        }
        self.origin = origin;
        self.state = ResolutionState::DetailReady {
            recipe,
            candidates: Vec::new(),
            request: None,
        };
        Ok(())
    }

    /// Close the detail view, back to the candidate list if there was one
    pub fn leave_detail(&mut self) -> Result<Screen, ResolutionError> {
        let state = std::mem::take(&mut self.state);
        let ResolutionState::DetailReady { candidates, request, .. } = state else {
            self.state = state;
            return Err(ResolutionError::NotInDetail);
        };

        match request {
            Some(request) if !candidates.is_empty() => {
                self.state = ResolutionState::CandidatesReady { request, candidates };
                Ok(Screen::Candidates)
            }
            _ => Ok(self.origin),
        }
    }

    /// Close the candidate list and return to the origin screen
    pub fn close_candidates(&mut self) -> Screen {
        if matches!(self.state, ResolutionState::CandidatesReady { .. }) {
            self.state = ResolutionState::Idle;
        }
        self.origin
    }
}

/// Mark generated recipes as AI output and attach seed context
fn tag_candidates(
    recipes: Vec<Recipe>,
    request: &GenerationRequest,
    token: GenerationToken,
) -> Vec<Recipe> {
    recipes
        .into_iter()
        .enumerate()
        .map(|(index, mut recipe)| {
            recipe.source = Provenance::Ai;
            if let GenerationRequest::Seed(seed_request) = request {
                recipe.category = seed_request.seed.category;
            }
            if recipe.recipe_id.trim().is_empty() {
                recipe.recipe_id = format!("ai-{}-{}", token.0, index + 1);
            }
            recipe
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user_profile::InMemoryProfileStore;

    fn response(count: usize) -> GenerationResponse {
        GenerationResponse {
            recipes: (0..count)
                .map(|i| Recipe::new(&format!("r{i}"), "菜", Category::Rice))
                .collect(),
            ..Default::default()
        }
    }

    fn controller() -> RecipeResolutionController<InMemoryProfileStore> {
        RecipeResolutionController::new(InMemoryProfileStore::new())
    }

    #[test]
    fn test_second_begin_is_refused() {
        let mut controller = controller();
        let request = GenerationRequest::from_ingredients(vec!["蛋".to_string()]);
        controller.begin(request.clone(), Screen::Capture).unwrap();
        assert_eq!(
            controller.begin(request, Screen::Capture),
            Err(ResolutionError::RequestInFlight)
        );
    }

    #[test]
    fn test_empty_ingredient_list_is_rejected() {
        let mut controller = controller();
        let request = GenerationRequest::from_ingredients(vec![]);
        assert_eq!(
            controller.begin(request, Screen::Capture),
            Err(ResolutionError::EmptyIngredientList)
        );
        assert_eq!(controller.state(), &ResolutionState::Idle);
    }

    #[test]
    fn test_stale_completion_is_discarded() {
        let mut controller = controller();
        let pending = controller
            .begin(GenerationRequest::from_ingredients(vec!["蛋".to_string()]), Screen::Home)
            .unwrap();

        assert_eq!(controller.abandon(), Screen::Home);
        assert_eq!(controller.complete(pending.token, Ok(response(2))), Completion::Stale);
        assert_eq!(controller.state(), &ResolutionState::Idle);
    }

    #[test]
    fn test_old_token_is_ignored_after_restart() {
        let mut controller = controller();
        let request = GenerationRequest::from_ingredients(vec!["蛋".to_string()]);
        let first = controller.begin(request.clone(), Screen::Home).unwrap();
        controller.abandon();
        let second = controller.begin(request, Screen::Home).unwrap();
        assert_ne!(first.token, second.token);

        assert_eq!(controller.complete(first.token, Ok(response(1))), Completion::Stale);
        assert!(controller.state().is_generating());
        assert_eq!(controller.complete(second.token, Ok(response(1))), Completion::Applied);
        assert_eq!(controller.candidates().len(), 1);
    }

    #[test]
    fn test_blank_ids_are_filled() {
        let mut controller = controller();
        let pending = controller
            .begin(GenerationRequest::from_ingredients(vec!["蛋".to_string()]), Screen::Home)
            .unwrap();
        let mut body = response(1);
        body.recipes[0].recipe_id = String::new();
        controller.complete(pending.token, Ok(body));
        assert_eq!(controller.candidates()[0].recipe_id, format!("ai-{}-1", pending.token.0));
    }

    #[test]
    fn test_leave_detail_outside_detail() {
        let mut controller = controller();
        assert_eq!(controller.leave_detail(), Err(ResolutionError::NotInDetail));
        assert_eq!(controller.state(), &ResolutionState::Idle);
    }
}
