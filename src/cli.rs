//! Command-line front end: onboarding, browsing, generation and cook mode.

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::{info, warn};

use crate::cook_mode::{format_countdown, CookEvent, CookSession};
use crate::gemini_client::GeminiRecipeGenerator;
use crate::generation::RecipeGenerator;
use crate::generation_config::GenerationConfig;
use crate::ingredient_capture::CapturedIngredients;
use crate::ingredient_grouper::IngredientGroup;
use crate::localization::{t_args_lang, t_lang};
use crate::onboarding::{Advance, OnboardingWizard, SelectionList};
use crate::recipe_detail::RecipeDetail;
use crate::recipe_model::{Category, DetailLevel, Recipe, SeedRecipe};
use crate::resolution::{
    GenerationRequest, IngredientListRequest, RecipeResolutionController, ResolutionState, Screen,
    DEFAULT_REQUEST_SERVINGS,
};
use crate::seed_catalog::{self, RankingOrder, TOP_RANKING_SIZE};
use crate::user_profile::{
    startup_route, JsonFileProfileStore, ProfileStore, StartupRoute, UserProfile, DEFAULT_LANGUAGE,
};

/// Environment variable overriding the profile file location
pub const PROFILE_PATH_ENV_VAR: &str = "RECIPE_CHEF_PROFILE";

/// Profile file used when nothing else is configured
pub const DEFAULT_PROFILE_PATH: &str = "./recipe_chef_profile.json";

#[derive(Parser, Debug)]
#[command(
    name = "recipe-chef",
    version,
    about = "Turn the ingredients you have into recipes",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path of the JSON file holding the user profile
    #[arg(long, global = true, env = PROFILE_PATH_ENV_VAR, default_value = DEFAULT_PROFILE_PATH)]
    pub profile_path: PathBuf,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create or replace the dietary profile
    Onboard {
        /// Display name
        #[arg(long)]
        name: String,

        /// Allergen to avoid (repeatable)
        #[arg(long = "allergy")]
        allergies: Vec<String>,

        /// Dietary rule (repeatable)
        #[arg(long = "rule")]
        rules: Vec<String>,

        /// Available kitchen equipment (repeatable)
        #[arg(long)]
        equipment: Vec<String>,

        /// Prefer short step descriptions
        #[arg(long)]
        concise: bool,

        /// Opt in to cloud sync
        #[arg(long)]
        opt_in: bool,

        /// Interface language, e.g. zh-TW or en
        #[arg(long)]
        language: Option<String>,
    },

    /// Show the stored profile
    Profile,

    /// List the home ranking or one category of seed recipes
    Browse {
        /// Category to list (麵類, rice, soup ...)
        #[arg(long)]
        category: Option<String>,

        /// Ranking order for the home list
        #[arg(long, value_enum, default_value_t = SortOrder::Overall)]
        sort: SortOrder,
    },

    /// Generate recipes from an ingredient list
    Generate {
        /// Ingredient names, comma separated; defaults to the capture preset
        #[arg(long, value_delimiter = ',')]
        ingredients: Vec<String>,

        /// Extra ingredient to add to the list (repeatable)
        #[arg(long)]
        add: Vec<String>,

        /// Ingredient to drop from the list (repeatable)
        #[arg(long)]
        remove: Vec<String>,

        /// Servings to ask for
        #[arg(long, default_value_t = DEFAULT_REQUEST_SERVINGS)]
        servings: u32,

        /// Preferred category (repeatable)
        #[arg(long)]
        category: Vec<String>,

        /// Free-text wish passed to the generator
        #[arg(long)]
        text: Option<String>,

        #[command(flatten)]
        view: ViewArgs,
    },

    /// Generate recipes inspired by a seed recipe
    Seed {
        /// Seed recipe id, e.g. seed-2
        recipe_id: String,

        /// Servings to ask for; defaults to the seed's own
        #[arg(long)]
        servings: Option<u32>,

        #[command(flatten)]
        view: ViewArgs,
    },
}

/// How to follow up on the generated candidates
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ViewArgs {
    /// Open the candidate at this 1-based position
    #[arg(long)]
    pub pick: Option<usize>,

    /// Show the picked recipe scaled to this many servings
    #[arg(long)]
    pub scale_to: Option<u32>,

    /// Walk through the picked recipe step by step
    #[arg(long)]
    pub cook: bool,

    /// Retry this many times when generation fails
    #[arg(long, default_value_t = 0)]
    pub retries: u32,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Overall,
    Rating,
    Reviews,
}

impl From<SortOrder> for RankingOrder {
    fn from(order: SortOrder) -> Self {
        match order {
            SortOrder::Overall => RankingOrder::Overall,
            SortOrder::Rating => RankingOrder::HighestRated,
            SortOrder::Reviews => RankingOrder::MostReviewed,
        }
    }
}

pub fn parse_args() -> Cli {
    Cli::parse()
}

/// Execute the parsed command
pub async fn run(cli: Cli) -> Result<()> {
    let store = JsonFileProfileStore::new(&cli.profile_path);

    match cli.command {
        Command::Onboard {
            name,
            allergies,
            rules,
            equipment,
            concise,
            opt_in,
            language,
        } => {
            let mut wizard = OnboardingWizard::new();
            wizard.set_display_name(&name);
            for item in &allergies {
                wizard.toggle(SelectionList::Allergies, item);
            }
            for item in &rules {
                wizard.toggle(SelectionList::DietaryRules, item);
            }
            for item in &equipment {
                wizard.toggle(SelectionList::Equipment, item);
            }
            if concise {
                wizard.set_detail_level(DetailLevel::Concise);
            }
            wizard.set_opt_in_cloud(opt_in);

            let language = language.unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());
            let profile = complete_onboarding(&mut wizard, &language)?;
            store.save(&profile)?;
            println!(
                "{}",
                t_args_lang("onboarding-complete", &profile.language, &[("name", &profile.display_name)])
            );
            Ok(())
        }
        Command::Profile => {
            match store.load() {
                Some(profile) => println!("{}", serde_json::to_string_pretty(&profile)?),
                None => println!("{}", t_lang("onboarding-welcome", DEFAULT_LANGUAGE)),
            }
            Ok(())
        }
        Command::Browse { category, sort } => {
            let language = profile_language(&store);
            match category {
                Some(raw) => {
                    let category = parse_category(&raw)?;
                    println!(
                        "{}",
                        t_args_lang("category-recommendations", &language, &[("category", category.label())])
                    );
                    for seed in seed_catalog::by_category(category) {
                        print_seed(seed);
                    }
                }
                None => {
                    println!("{}", t_lang("home-ranking", &language));
                    for seed in seed_catalog::top_ranked(TOP_RANKING_SIZE, sort.into()) {
                        print_seed(seed);
                    }
                }
            }
            Ok(())
        }
        Command::Generate {
            ingredients,
            add,
            remove,
            servings,
            category,
            text,
            view,
        } => {
            let mut captured = if ingredients.is_empty() {
                CapturedIngredients::with_defaults()
            } else {
                CapturedIngredients::from_names(&ingredients)
            };
            for name in &add {
                captured.add(name);
            }
            for name in &remove {
                captured.remove(name);
            }

            let preferred_categories = category
                .iter()
                .map(|raw| parse_category(raw))
                .collect::<Result<Vec<_>>>()?;

            let request = GenerationRequest::IngredientList(IngredientListRequest {
                ingredients: captured.into_vec(),
                servings,
                preferred_categories,
                free_text: text,
            });
            let generator = GeminiRecipeGenerator::new(GenerationConfig::from_env())?;
            resolve(store, &generator, request, Screen::Capture, &view).await
        }
        Command::Seed {
            recipe_id,
            servings,
            view,
        } => {
            let seed = seed_catalog::find(&recipe_id)
                .ok_or_else(|| anyhow!("Unknown seed recipe '{recipe_id}'"))?;
            let mut request = GenerationRequest::from_seed(seed);
            if let (GenerationRequest::Seed(seed_request), Some(servings)) = (&mut request, servings) {
                seed_request.servings = servings.max(1);
            }
            let generator = GeminiRecipeGenerator::new(GenerationConfig::from_env())?;
            resolve(store, &generator, request, Screen::CategoryList(seed.category), &view).await
        }
    }
}

fn complete_onboarding(wizard: &mut OnboardingWizard, language: &str) -> Result<UserProfile> {
    loop {
        match wizard.advance() {
            Ok(Advance::Step(step)) => info!(step = step.number(), "Onboarding step"),
            Ok(Advance::Complete(mut profile)) => {
                profile.language = language.to_string();
                profile.touch();
                return Ok(profile);
            }
            Err(e) => bail!(t_lang(e.message_key(), language)),
        }
    }
}

fn profile_language(store: &dyn ProfileStore) -> String {
    store
        .load()
        .map(|profile| profile.language)
        .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string())
}

fn parse_category(raw: &str) -> Result<Category> {
    Category::parse(raw).ok_or_else(|| {
        let known: Vec<&str> = Category::ALL.iter().map(Category::label).collect();
        anyhow!("Unknown category '{raw}', expected one of {}", known.join(", "))
    })
}

fn print_seed(seed: &SeedRecipe) {
    let rating = seed.rating.map(|r| format!("★{r:.1}")).unwrap_or_default();
    let reviews = seed.review_count.map(|c| format!(" ({c})")).unwrap_or_default();
    println!(
        "  {:<8} {} [{}] {}{} {} 分鐘",
        seed.recipe_id, seed.title, seed.category, rating, reviews, seed.total_time_minutes
    );
}

/// Run one generation through the controller and present the outcome
async fn resolve<S, G>(
    store: S,
    generator: &G,
    request: GenerationRequest,
    origin: Screen,
    view: &ViewArgs,
) -> Result<()>
where
    S: ProfileStore,
    G: RecipeGenerator + ?Sized,
{
    if startup_route(&store) == StartupRoute::Onboarding {
        warn!("No profile stored yet, generating with defaults");
    }
    let language = profile_language(&store);
    let mut controller = RecipeResolutionController::new(store);

    println!("{}", t_lang("generation-in-progress", &language));
    println!("{}", t_lang("generation-in-progress-detail", &language));
    controller.submit(generator, request, origin).await?;

    let mut attempts = 0;
    while let ResolutionState::Error { message, .. } = controller.state() {
        if attempts >= view.retries {
            break;
        }
        attempts += 1;
        println!("{message} ({} {attempts})", t_lang("generation-retry", &language));
        controller.retry(generator).await?;
    }

    if let ResolutionState::Error { message, cause, .. } = controller.state() {
        let error = anyhow!(cause.clone()).context(message.clone());
        controller.dismiss();
        return Err(error);
    }

    let candidates = controller.candidates();
    println!(
        "{}",
        t_args_lang("candidates-title", &language, &[("count", &candidates.len().to_string())])
    );
    for (index, recipe) in candidates.iter().enumerate() {
        println!("  {}. {}", index + 1, recipe);
        if !recipe.short_description.is_empty() {
            println!("     {}", recipe.short_description);
        }
    }

    let Some(pick) = view.pick else {
        return Ok(());
    };
    let index = pick
        .checked_sub(1)
        .context("Candidate positions start at 1")?;
    let recipe = controller.select_candidate(index)?.clone();

    let mut detail = RecipeDetail::new(recipe);
    if let Some(servings) = view.scale_to {
        detail.set_servings(servings);
    }
    print_detail(&mut detail, &language);

    if view.cook {
        cook(detail.recipe(), &language);
    }

    controller.leave_detail()?;
    println!("{}", t_lang("candidates-back", &language));
    Ok(())
}

fn print_detail(detail: &mut RecipeDetail, language: &str) {
    let servings = detail.servings().to_string();
    let kcal = format!("{:.0}", detail.scaled_calories());
    let recipe = detail.recipe().clone();

    println!();
    println!("{} [{}]", recipe.title, recipe.category);
    println!(
        "{} · {}",
        t_args_lang("detail-servings", language, &[("servings", &servings)]),
        t_args_lang("detail-calories", language, &[("kcal", &kcal)])
    );

    let grouped = detail.grouped();
    for (group, key) in [
        (IngredientGroup::Main, "section-main"),
        (IngredientGroup::Auxiliary, "section-auxiliary"),
        (IngredientGroup::Seasoning, "section-seasoning"),
    ] {
        let items = grouped.group(group);
        if items.is_empty() {
            continue;
        }
        println!("{}", t_lang(key, language));
        for ingredient in items {
            println!("  - {ingredient}");
        }
    }

    for substitution in &recipe.missing_or_substitutions {
        println!("  * {} → {}", substitution.missing, substitution.substitute);
    }
    for note in &recipe.safety_notes {
        println!("  ! {note}");
    }
}

/// Print every step in order the way cook mode pages through them
fn cook(recipe: &Recipe, language: &str) {
    let Some(mut session) = CookSession::start(recipe) else {
        warn!(recipe_id = %recipe.recipe_id, "Recipe has no steps to cook");
        return;
    };

    let total = session.step_count().to_string();
    loop {
        let current = (session.current_index() + 1).to_string();
        let step = session.current_step();
        println!();
        println!(
            "{}",
            t_args_lang("cook-mode-progress", language, &[("current", &current), ("total", &total)])
        );
        println!("{}", step.title);
        println!("{}", step.text);
        if let Some(seconds) = session.start_timer() {
            println!("⏱ {}", format_countdown(seconds));
        }

        if session.next() == CookEvent::Finished {
            println!("{}", t_lang("cook-finished", language));
            break;
        }
    }
}
