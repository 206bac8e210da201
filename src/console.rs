// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Line-oriented console front end.
//!
//! Each input line parses into a [`Command`]; a [`Session`] runs it against
//! the app and returns the text to print.

use crate::error::AppError;
use crate::models::{DailySummary, Food, Meal, MealType, NutritionTotals};
use crate::services::LookupOutcome;
use crate::App;
use chrono::NaiveDate;
use std::fmt::Write as _;
use std::str::FromStr;

pub const HELP: &str = "\
Commands:
  new <type>        start a meal (breakfast, lunch, dinner, snack)
  search <text>     search foods by name
  scan <code>       look up a barcode and add it to the current meal
  add <n>           add result number n of the last search
  remove <food id>  remove a food from the current meal
  show              show the current meal
  save              save the current meal
  discard           drop the current meal
  meals             list saved meals
  meal <id>         show a saved meal
  delete <id>       delete a saved meal
  days              nutrition per day
  day <YYYY-MM-DD>  nutrition for one day
  help              this text
  quit              leave";

/// One console command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    New(MealType),
    Search(String),
    Scan(String),
    Add(usize),
    Remove(String),
    Show,
    Save,
    Discard,
    Meals,
    Meal(String),
    Delete(String),
    Days,
    Day(NaiveDate),
    Quit,
}

impl FromStr for Command {
    type Err = AppError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (verb, rest) = line
            .split_once(char::is_whitespace)
            .map(|(v, r)| (v, r.trim()))
            .unwrap_or((line, ""));

        let required = |what: &str| -> Result<String, AppError> {
            if rest.is_empty() {
                Err(AppError::BadRequest(format!("{} requires {}", verb, what)))
            } else {
                Ok(rest.to_string())
            }
        };

        match verb.to_lowercase().as_str() {
            "help" | "?" => Ok(Command::Help),
            "new" => required("a meal type")?
                .parse::<MealType>()
                .map(Command::New)
                .map_err(AppError::BadRequest),
            "search" => Ok(Command::Search(required("a query")?)),
            "scan" => Ok(Command::Scan(required("a barcode")?)),
            "add" => required("a result number")?
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .map(Command::Add)
                .ok_or_else(|| AppError::BadRequest(format!("not a result number: {}", rest))),
            "remove" => Ok(Command::Remove(required("a food id")?)),
            "show" => Ok(Command::Show),
            "save" => Ok(Command::Save),
            "discard" => Ok(Command::Discard),
            "meals" => Ok(Command::Meals),
            "meal" => Ok(Command::Meal(required("a meal id")?)),
            "delete" => Ok(Command::Delete(required("a meal id")?)),
            "days" => Ok(Command::Days),
            "day" => NaiveDate::parse_from_str(&required("a date")?, "%Y-%m-%d")
                .map(Command::Day)
                .map_err(|e| AppError::BadRequest(format!("bad date {}: {}", rest, e))),
            "quit" | "exit" => Ok(Command::Quit),
            "" => Err(AppError::BadRequest("empty command".to_string())),
            other => Err(AppError::BadRequest(format!("unknown command: {}", other))),
        }
    }
}

/// Interactive session state.
pub struct Session<'a> {
    app: &'a App,
    last_results: Vec<Food>,
}

impl<'a> Session<'a> {
    pub fn new(app: &'a App) -> Self {
        Self {
            app,
            last_results: Vec::new(),
        }
    }

    /// Results of the most recent search.
    pub fn last_results(&self) -> &[Food] {
        &self.last_results
    }

    /// Run one command and return the text to print.
    pub async fn execute(&mut self, command: Command) -> Result<String, AppError> {
        match command {
            Command::Help => Ok(HELP.to_string()),
            Command::Quit => Ok(String::new()),
            Command::New(kind) => {
                let mut store = self.app.meals.lock().await;
                let meal = store.create_current_meal(kind);
                Ok(format!("Started {} ({})", meal.name, meal.id))
            }
            Command::Search(query) => {
                let outcome = self.app.lookup.search_by_text_outcome(&query).await;
                let note = match &outcome {
                    LookupOutcome::TooShort => Some(format!(
                        "Type at least {} characters.",
                        self.app.lookup.settings().min_query_len
                    )),
                    LookupOutcome::Found(_) => None,
                    _ => Some("No products found.".to_string()),
                };
                self.last_results = outcome.into_foods();

                if let Some(note) = note {
                    return Ok(note);
                }
                let mut out = String::new();
                for (i, food) in self.last_results.iter().enumerate() {
                    let _ = writeln!(out, "{:>2}. {}", i + 1, format_food(food));
                }
                Ok(out.trim_end().to_string())
            }
            Command::Scan(code) => match self.app.scan_into_current_meal(&code).await? {
                Some(food) => Ok(format!("Added {}", format_food(&food))),
                None => Ok(format!("No product matches barcode {}.", code)),
            },
            Command::Add(n) => {
                let food = self
                    .last_results
                    .get(n.wrapping_sub(1))
                    .cloned()
                    .ok_or_else(|| AppError::NotFound(format!("search result {}", n)))?;
                let name = food.name.clone();
                if !self.app.meals.lock().await.add_food(food) {
                    return Err(AppError::NoCurrentMeal);
                }
                self.last_results.clear();
                Ok(format!("Added {}", name))
            }
            Command::Remove(food_id) => {
                let removed = self.app.meals.lock().await.remove_food(&food_id);
                Ok(format!("Removed {} item(s)", removed))
            }
            Command::Show => {
                let store = self.app.meals.lock().await;
                let meal = store.current_meal().ok_or(AppError::NoCurrentMeal)?;
                Ok(format_meal(meal))
            }
            Command::Save => {
                let mut store = self.app.meals.lock().await;
                if !store.can_save() {
                    return match store.current_meal() {
                        None => Err(AppError::NoCurrentMeal),
                        Some(_) => Err(AppError::BadRequest(
                            "add at least one food before saving".to_string(),
                        )),
                    };
                }
                let meal = store.save_current_meal().await?;
                Ok(format!(
                    "Saved {} ({}, {:.0} kcal)",
                    meal.name,
                    meal.id,
                    meal.total_calories()
                ))
            }
            Command::Discard => match self.app.meals.lock().await.discard_current_meal() {
                Some(meal) => Ok(format!("Discarded {}", meal.name)),
                None => Err(AppError::NoCurrentMeal),
            },
            Command::Meals => {
                let store = self.app.meals.lock().await;
                let items = store.list_items();
                if items.is_empty() {
                    return Ok("No meals saved yet.".to_string());
                }
                let mut out = String::new();
                for item in items {
                    let _ = writeln!(
                        out,
                        "{}  {}  {}  {:.0} kcal  {}",
                        item.id,
                        item.date.get(..10).unwrap_or(item.date.as_str()),
                        item.name,
                        item.total_calories,
                        item.food_names
                    );
                }
                Ok(out.trim_end().to_string())
            }
            Command::Meal(id) => {
                let store = self.app.meals.lock().await;
                let meal = store
                    .meal(&id)
                    .ok_or_else(|| AppError::NotFound(format!("meal {}", id)))?;
                Ok(format_meal(meal))
            }
            Command::Delete(id) => {
                if self.app.meals.lock().await.delete_meal(&id).await {
                    Ok(format!("Deleted meal {}", id))
                } else {
                    Ok(format!("No meal {}", id))
                }
            }
            Command::Days => {
                let days = self.app.meals.lock().await.daily_summaries();
                if days.is_empty() {
                    return Ok("No meals saved yet.".to_string());
                }
                Ok(days
                    .iter()
                    .map(format_day)
                    .collect::<Vec<_>>()
                    .join("\n"))
            }
            Command::Day(day) => match self.app.meals.lock().await.day_summary(day) {
                Some(summary) => Ok(format_day(&summary)),
                None => Ok(format!("No meals on {}", day)),
            },
        }
    }
}

fn format_food(food: &Food) -> String {
    format!(
        "{} - {} [{}] {:.0} kcal (id {})",
        food.name, food.brand, food.nutriscore, food.calories, food.id
    )
}

fn format_totals(totals: &NutritionTotals) -> String {
    format!(
        "{:.0} kcal, proteins {:.1} g, carbs {:.1} g, fats {:.1} g",
        totals.calories, totals.proteins, totals.carbs, totals.fats
    )
}

fn format_meal(meal: &Meal) -> String {
    let mut out = format!("{} ({}) {}\n", meal.name, meal.id, meal.date);
    let _ = writeln!(out, "Total: {}", format_totals(&meal.totals()));
    let _ = write!(out, "Foods ({}):", meal.foods.len());
    for food in &meal.foods {
        let _ = write!(out, "\n  {}", format_food(food));
    }
    out
}

fn format_day(summary: &DailySummary) -> String {
    format!(
        "{}  {} meal(s)  {}",
        summary.day,
        summary.meal_count,
        format_totals(&summary.totals)
    )
}
