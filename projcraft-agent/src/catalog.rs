//! Category table.
//!
//! Requests are classified by substring match against an ordered keyword
//! table; the first row that matches wins and [`Category::General`] is the
//! default. Each category carries the canned data used whenever the model is
//! out of the picture: a plan template, a folder layout, a scoring rule and
//! an improvement layout.

use crate::artifact::{Artifact, FileType};
use crate::plan::ProjectType;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Calculator,
    UrlShortener,
    Workout,
    Todo,
    Blog,
    Ecommerce,
    Chat,
    Web,
    Api,
    Game,
    Dashboard,
    MultiModule,
    Simple,
    General,
}

/// One row of the classification table
#[derive(Debug, Clone, Copy)]
pub struct CategoryRow {
    pub category: Category,
    pub keywords: &'static [&'static str],
}

/// Ordered classification table, first match wins
pub const CATEGORY_TABLE: &[CategoryRow] = &[
    CategoryRow { category: Category::Calculator, keywords: &["calculator", "calc"] },
    CategoryRow { category: Category::UrlShortener, keywords: &["link shortener", "url shortener", "shorten"] },
    CategoryRow { category: Category::Workout, keywords: &["workout", "fitness", "exercise"] },
    CategoryRow { category: Category::Todo, keywords: &["todo", "task"] },
    CategoryRow { category: Category::Blog, keywords: &["blog", "cms"] },
    CategoryRow { category: Category::Ecommerce, keywords: &["ecommerce", "shop", "store"] },
    CategoryRow { category: Category::Chat, keywords: &["chat", "messaging"] },
    CategoryRow { category: Category::Web, keywords: &["web", "html", "frontend"] },
    CategoryRow { category: Category::Api, keywords: &["api", "service", "backend"] },
    CategoryRow { category: Category::Game, keywords: &["game", "gaming"] },
    CategoryRow { category: Category::Dashboard, keywords: &["dashboard", "analytics"] },
    CategoryRow { category: Category::MultiModule, keywords: &["multi", "complex"] },
    CategoryRow { category: Category::Simple, keywords: &["simple", "basic"] },
];

/// Canned plan data for a category
#[derive(Debug, Clone, Copy)]
pub struct PlanTemplate {
    pub project_type: ProjectType,
    pub technology_stack: &'static [&'static str],
    pub features: &'static [&'static str],
    pub estimated_file_count: u32,
    pub complexity_level: &'static str,
}

/// Canned folder layout.
///
/// Filenames are used verbatim as workspace paths; the folder name only
/// selects the role used to derive file specifications.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub architecture_pattern: &'static str,
    pub folders: &'static [(&'static str, &'static [&'static str])],
    pub folder_organization: &'static str,
    /// Empty means "use the plan's technology stack"
    pub dependencies: &'static [&'static str],
}

/// Domain-specific part of the quality score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreRule {
    Calculator,
    Todo,
    Web,
    Api,
    Generic,
}

const WEB_STACK: &[&str] = &["python", "flask", "sqlite", "html", "css", "javascript"];

impl PlanTemplate {
    const fn new(
        project_type: ProjectType,
        technology_stack: &'static [&'static str],
        features: &'static [&'static str],
        estimated_file_count: u32,
        complexity_level: &'static str,
    ) -> Self {
        Self { project_type, technology_stack, features, estimated_file_count, complexity_level }
    }
}

impl Category {
    /// Classify a free-text request
    pub fn classify(request: &str) -> Self {
        let request = request.to_lowercase();
        CATEGORY_TABLE
            .iter()
            .find(|row| row.keywords.iter().any(|kw| request.contains(kw)))
            .map(|row| row.category)
            .unwrap_or(Category::General)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Calculator => "calculator",
            Self::UrlShortener => "url_shortener",
            Self::Workout => "workout",
            Self::Todo => "todo",
            Self::Blog => "blog",
            Self::Ecommerce => "ecommerce",
            Self::Chat => "chat",
            Self::Web => "web",
            Self::Api => "api",
            Self::Game => "game",
            Self::Dashboard => "dashboard",
            Self::MultiModule => "multi_module",
            Self::Simple => "simple",
            Self::General => "general",
        }
    }

    pub fn plan_template(&self) -> PlanTemplate {
        let t = PlanTemplate::new;
        match self {
            Self::Calculator => t(
                ProjectType::SingleFile,
                &["python"],
                &["Basic arithmetic operations", "User input handling", "Error handling"],
                1,
                "simple",
            ),
            Self::UrlShortener => t(
                ProjectType::WebApp,
                WEB_STACK,
                &["URL shortening", "Database storage", "Web interface", "Redirect handling", "Analytics"],
                8,
                "medium",
            ),
            Self::Workout => t(
                ProjectType::WebApp,
                WEB_STACK,
                &["Workout tracking", "Diet planning", "Progress monitoring", "User profiles", "Exercise database"],
                10,
                "medium",
            ),
            Self::Todo => t(
                ProjectType::WebApp,
                WEB_STACK,
                &["Add tasks", "Remove tasks", "List tasks", "Mark complete", "Task categories"],
                6,
                "medium",
            ),
            Self::Blog => t(
                ProjectType::WebApp,
                WEB_STACK,
                &["Post creation", "User authentication", "Comments", "Categories", "Admin panel"],
                12,
                "complex",
            ),
            Self::Ecommerce => t(
                ProjectType::WebApp,
                WEB_STACK,
                &["Product catalog", "Shopping cart", "User accounts", "Payment processing", "Order management"],
                15,
                "complex",
            ),
            Self::Chat => t(
                ProjectType::WebApp,
                &["python", "flask", "sqlite", "html", "css", "javascript", "websockets"],
                &["Real-time messaging", "User authentication", "Message history", "Online status"],
                8,
                "medium",
            ),
            Self::Web => t(
                ProjectType::WebApp,
                &["python", "flask", "html", "css", "javascript"],
                &["Responsive layout", "Interactive user interface", "Backend routes", "Error handling"],
                5,
                "medium",
            ),
            Self::Api => t(
                ProjectType::ApiService,
                &["python", "fastapi", "sqlalchemy", "pydantic"],
                &["RESTful endpoints", "Database integration", "Authentication", "Documentation"],
                6,
                "medium",
            ),
            Self::Game => t(
                ProjectType::WebApp,
                &["python", "pygame", "html", "css", "javascript"],
                &["Game logic", "User interface", "Score tracking", "Multiple levels"],
                5,
                "medium",
            ),
            Self::Dashboard => t(
                ProjectType::WebApp,
                &["python", "flask", "sqlite", "html", "css", "javascript", "chart.js"],
                &["Data visualization", "Charts and graphs", "Real-time updates", "Export functionality"],
                10,
                "medium",
            ),
            Self::MultiModule => t(
                ProjectType::MultiFile,
                &["python"],
                &["Core functionality", "Modular design", "Configuration management", "Error handling"],
                7,
                "complex",
            ),
            Self::Simple => t(
                ProjectType::SingleFile,
                &["python"],
                &["Core functionality", "User interface", "Error handling"],
                1,
                "simple",
            ),
            Self::General => t(
                ProjectType::WebApp,
                &["python", "flask", "html", "css", "javascript"],
                &["Core functionality", "User interface", "Data handling", "Error handling"],
                5,
                "medium",
            ),
        }
    }

    pub fn layout(&self) -> &'static Layout {
        match self {
            Self::Calculator => &CALCULATOR_LAYOUT,
            Self::UrlShortener => &SHORTENER_LAYOUT,
            Self::Workout => &WORKOUT_LAYOUT,
            Self::Todo => &TODO_LAYOUT,
            Self::Blog => &BLOG_LAYOUT,
            Self::Ecommerce => &ECOMMERCE_LAYOUT,
            Self::Chat => &CHAT_LAYOUT,
            Self::Web => &WEB_LAYOUT,
            Self::Api => &API_LAYOUT,
            Self::Game => &GAME_LAYOUT,
            Self::Dashboard => &DASHBOARD_LAYOUT,
            Self::MultiModule => &MULTI_LAYOUT,
            Self::Simple | Self::General => &DEFAULT_LAYOUT,
        }
    }

    pub fn score_rule(&self) -> ScoreRule {
        match self {
            Self::Calculator => ScoreRule::Calculator,
            Self::Todo => ScoreRule::Todo,
            Self::Api => ScoreRule::Api,
            Self::UrlShortener
            | Self::Workout
            | Self::Blog
            | Self::Ecommerce
            | Self::Chat
            | Self::Web
            | Self::Game
            | Self::Dashboard => ScoreRule::Web,
            Self::MultiModule | Self::Simple | Self::General => ScoreRule::Generic,
        }
    }

    /// Layout that closes this category's typical gap, or `None` when the
    /// artifacts do not show that gap.
    pub fn improvement(&self, artifacts: &[Artifact]) -> Option<&'static Layout> {
        let count = |ty| artifacts.iter().filter(|a| a.file_type == ty).count();
        let python = count(FileType::Python);
        let has_markup_stack = count(FileType::Html) > 0 && count(FileType::Css) > 0 && count(FileType::Javascript) > 0;

        match self.score_rule() {
            ScoreRule::Todo if count(FileType::Html) == 0 => Some(&TODO_IMPROVED),
            ScoreRule::Calculator if python < 2 => Some(&CALCULATOR_IMPROVED),
            ScoreRule::Web if !has_markup_stack => Some(&WEB_IMPROVED),
            ScoreRule::Api if python < 4 => Some(&API_IMPROVED),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Layouts
// ============================================================================

const fn layout(
    architecture_pattern: &'static str,
    folders: &'static [(&'static str, &'static [&'static str])],
    folder_organization: &'static str,
    dependencies: &'static [&'static str],
) -> Layout {
    Layout { architecture_pattern, folders, folder_organization, dependencies }
}

pub const DEFAULT_LAYOUT: Layout = layout(
    "Simple",
    &[("root", &["README.md"]), ("src", &["main.py"])],
    "Single entry point with documentation",
    &[],
);

const CALCULATOR_LAYOUT: Layout = layout(
    "Simple",
    &[("root", &["README.md"]), ("src", &["calculator.py"])],
    "Single calculator module with documentation",
    &[],
);

const SHORTENER_LAYOUT: Layout = layout(
    "MVC",
    &[
        ("root", &["README.md", "requirements.txt", "config.py"]),
        ("backend", &["app.py", "models.py", "routes.py", "database.py"]),
        ("frontend", &["templates/index.html", "static/styles.css", "static/script.js"]),
        ("database", &["schema.sql"]),
    ],
    "Flask backend with SQLite storage and server-rendered pages",
    &[],
);

const WORKOUT_LAYOUT: Layout = layout(
    "Frontend/Backend",
    &[
        ("root", &["README.md", "requirements.txt"]),
        ("backend", &["main.py", "workout_manager.py", "diet_planner.py"]),
        ("frontend", &["index.html", "styles.css", "app.js", "workout.js", "diet.js"]),
    ],
    "Python services for workouts and diets behind a static frontend",
    &[],
);

const TODO_LAYOUT: Layout = layout(
    "Frontend/Backend",
    &[
        ("root", &["README.md", "requirements.txt"]),
        ("backend", &["main.py", "todo_manager.py"]),
        ("frontend", &["index.html", "styles.css", "app.js"]),
    ],
    "Task manager module served to a static frontend",
    &[],
);

const BLOG_LAYOUT: Layout = layout(
    "MVC",
    &[
        ("root", &["README.md", "requirements.txt", "config.py"]),
        ("backend", &["app.py", "models.py", "routes.py", "auth.py", "admin.py"]),
        (
            "frontend",
            &["templates/base.html", "templates/index.html", "templates/post.html", "static/styles.css", "static/script.js"],
        ),
        ("database", &["schema.sql"]),
    ],
    "Flask application with authentication, admin views and templates",
    &[],
);

const ECOMMERCE_LAYOUT: Layout = layout(
    "MVC",
    &[
        ("root", &["README.md", "requirements.txt", "config.py"]),
        ("backend", &["app.py", "models.py", "routes.py", "payment.py", "inventory.py"]),
        (
            "frontend",
            &["templates/base.html", "templates/products.html", "templates/cart.html", "static/styles.css", "static/script.js"],
        ),
        ("database", &["schema.sql"]),
    ],
    "Store backend with payment and inventory modules",
    &[],
);

const CHAT_LAYOUT: Layout = layout(
    "Real-time",
    &[
        ("root", &["README.md", "requirements.txt"]),
        ("backend", &["app.py", "models.py", "routes.py", "websocket.py"]),
        ("frontend", &["templates/index.html", "static/styles.css", "static/chat.js"]),
    ],
    "Websocket server with message persistence and a browser client",
    &[],
);

const WEB_LAYOUT: Layout = layout(
    "Frontend/Backend",
    &[
        ("root", &["README.md", "requirements.txt"]),
        ("backend", &["main.py", "app.py"]),
        ("frontend", &["index.html", "styles.css", "script.js"]),
    ],
    "Flask backend serving a static frontend",
    &[],
);

const API_LAYOUT: Layout = layout(
    "RESTful API",
    &[
        ("root", &["README.md", "requirements.txt"]),
        ("src", &["main.py", "models.py", "routes.py"]),
        ("config", &["config.py"]),
    ],
    "Service entry point, models and routes with separate configuration",
    &[],
);

const GAME_LAYOUT: Layout = layout(
    "Frontend/Backend",
    &[
        ("root", &["README.md", "requirements.txt"]),
        ("backend", &["main.py", "game.py"]),
        ("frontend", &["index.html", "styles.css", "game.js"]),
    ],
    "Game logic module with a browser front end",
    &[],
);

const DASHBOARD_LAYOUT: Layout = layout(
    "MVC",
    &[
        ("root", &["README.md", "requirements.txt", "config.py"]),
        ("backend", &["app.py", "models.py", "routes.py"]),
        ("frontend", &["templates/dashboard.html", "static/styles.css", "static/charts.js"]),
    ],
    "Data backend feeding chart views",
    &[],
);

const MULTI_LAYOUT: Layout = layout(
    "Modular",
    &[
        ("root", &["README.md", "requirements.txt"]),
        ("src", &["main.py", "utils.py", "models.py"]),
        ("modules", &["module1.py", "module2.py"]),
    ],
    "Entry point with shared utilities and feature modules",
    &[],
);

// ============================================================================
// Improvement layouts
// ============================================================================

const TODO_IMPROVED: Layout = layout(
    "MVC",
    &[
        ("root", &["README.md", "requirements.txt"]),
        ("src", &["main.py", "todo_manager.py"]),
        ("static", &["index.html", "styles.css", "app.js", "todo.js"]),
    ],
    "Task manager with a web frontend",
    &["python", "flask", "sqlite3"],
);

const CALCULATOR_IMPROVED: Layout = layout(
    "Simple",
    &[("root", &["README.md"]), ("src", &["calculator.py", "math_operations.py"])],
    "Calculator interface split from its math operations",
    &["python"],
);

const WEB_IMPROVED: Layout = layout(
    "Frontend/Backend",
    &[
        ("root", &["README.md", "requirements.txt"]),
        ("src", &["main.py", "app.py"]),
        ("static", &["index.html", "styles.css", "script.js", "utils.js"]),
    ],
    "Flask backend with a complete static frontend",
    &["python", "flask", "html", "css", "javascript"],
);

const API_IMPROVED: Layout = layout(
    "RESTful API",
    &[
        ("root", &["README.md", "requirements.txt"]),
        ("src", &["main.py", "models.py", "routes.py", "database.py"]),
        ("config", &["config.py", "settings.py"]),
    ],
    "Service with persistence layer and layered configuration",
    &["python", "fastapi", "uvicorn", "sqlalchemy", "pydantic"],
);

/// Used when no category-specific improvement applies
pub const MODULAR_LAYOUT: Layout = layout(
    "Modular",
    &[
        ("root", &["README.md", "requirements.txt"]),
        ("src", &["main.py", "utils.py", "models.py", "config.py"]),
        ("static", &["index.html", "styles.css", "app.js"]),
        ("modules", &["module1.py", "module2.py"]),
    ],
    "Modular application with a web frontend",
    &["python", "flask", "html", "css", "javascript"],
);
