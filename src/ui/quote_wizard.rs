use anyhow::Result;
use chrono::Local;
use crossterm::event::{self, Event, KeyCode};
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::compose::{BACKEND_CATEGORIES, FRONTEND_CATEGORIES};
use crate::config::Config;
use crate::models::{
    ClientInfo, LineItem, OperationalCost, ProjectInfo, Quote, QuoteKind, DEFAULT_TERMS,
};
use crate::totals::{self, DeliverySuggestion};
use crate::ui::centered_rect;
use crate::ui::components::date_input::DateInput;

// The form is split into steps; each step owns a handful of fields.
#[derive(Clone, Copy, PartialEq)]
pub enum WizardStep {
    Details,
    Client,
    Project,
    BackendItems,
    FrontendItems,
    Costs,
    Commercial,
}

const STEPS: [WizardStep; 7] = [
    WizardStep::Details,
    WizardStep::Client,
    WizardStep::Project,
    WizardStep::BackendItems,
    WizardStep::FrontendItems,
    WizardStep::Costs,
    WizardStep::Commercial,
];

impl WizardStep {
    fn title(self) -> &'static str {
        match self {
            WizardStep::Details => "Quote Details",
            WizardStep::Client => "Client",
            WizardStep::Project => "Project",
            WizardStep::BackendItems => "Backend Items",
            WizardStep::FrontendItems => "Frontend Items",
            WizardStep::Costs => "Operational Costs",
            WizardStep::Commercial => "Commercial Terms",
        }
    }

    fn position(self) -> usize {
        STEPS.iter().position(|s| *s == self).unwrap_or(0)
    }

    fn next(self) -> Self {
        STEPS[(self.position() + 1) % STEPS.len()]
    }

    fn previous(self) -> Self {
        STEPS[(self.position() + STEPS.len() - 1) % STEPS.len()]
    }
}

// Represents a field in the quote form
#[derive(Clone, Copy, PartialEq)]
pub enum QuoteField {
    Number,
    IssueDate,
    ValidityDays,
    Kind,
    Delivery,
    ClientName,
    ClientEmail,
    ClientPhone,
    ClientAddress,
    ClientCompany,
    ProjectTitle,
    ProjectIntroduction,
    ProjectDevelopment,
    ProjectConclusion,
    Items,
    Costs,
    RevenueModel,
    Discount,
    Notes,
    Terms,
}

fn step_fields(step: WizardStep) -> &'static [QuoteField] {
    match step {
        WizardStep::Details => &[
            QuoteField::Number,
            QuoteField::IssueDate,
            QuoteField::ValidityDays,
            QuoteField::Kind,
            QuoteField::Delivery,
        ],
        WizardStep::Client => &[
            QuoteField::ClientName,
            QuoteField::ClientEmail,
            QuoteField::ClientPhone,
            QuoteField::ClientAddress,
            QuoteField::ClientCompany,
        ],
        WizardStep::Project => &[
            QuoteField::ProjectTitle,
            QuoteField::ProjectIntroduction,
            QuoteField::ProjectDevelopment,
            QuoteField::ProjectConclusion,
        ],
        WizardStep::BackendItems | WizardStep::FrontendItems => &[QuoteField::Items],
        WizardStep::Costs => &[QuoteField::Costs],
        WizardStep::Commercial => &[
            QuoteField::RevenueModel,
            QuoteField::Discount,
            QuoteField::Notes,
            QuoteField::Terms,
        ],
    }
}

// Represents a field being edited inside a line item
#[derive(Clone, Copy, PartialEq)]
pub enum ItemField {
    Category,
    Description,
    Details,
    Hours,
    HourlyRate,
    Quantity,
    UnitPrice,
}

#[derive(Clone, Copy, PartialEq)]
pub enum CostField {
    Description,
    Amount,
    Periodicity,
}

// Represents the wizard state
pub struct QuoteWizardState {
    hours_per_week: f64,
    number: String,
    issue_date: DateInput,
    validity_input: String,
    kind: QuoteKind,
    delivery: String,
    delivery_suggestion: DeliverySuggestion,
    client: ClientInfo,
    project: ProjectInfo,
    backend_items: Vec<LineItem>,
    frontend_items: Vec<LineItem>,
    backend_seq: u32,
    frontend_seq: u32,
    costs: Vec<OperationalCost>,
    revenue_model: String,
    discount_input: String,
    notes: String,
    terms: String,

    step: WizardStep,
    field_index: usize,
    editing: bool,
    active_input: String,
    items_list_state: ListState,
    costs_list_state: ListState,
    editing_item: Option<(usize, ItemField, String)>,
    editing_cost: Option<(usize, CostField, String)>,
    show_error: Option<String>,
}

impl QuoteWizardState {
    pub fn new(config: &Config) -> Self {
        let today = Local::now().date_naive();

        Self {
            hours_per_week: config.hours_per_week,
            number: String::new(),
            issue_date: DateInput::new(today),
            validity_input: "30".to_string(),
            kind: QuoteKind::Final,
            delivery: String::new(),
            delivery_suggestion: DeliverySuggestion::new(),
            client: ClientInfo::default(),
            project: ProjectInfo::default(),
            backend_items: vec![LineItem::new("backend-1", BACKEND_CATEGORIES[0])],
            frontend_items: vec![LineItem::new("frontend-1", FRONTEND_CATEGORIES[0])],
            backend_seq: 1,
            frontend_seq: 1,
            costs: Vec::new(),
            revenue_model: String::new(),
            discount_input: String::new(),
            notes: String::new(),
            terms: String::new(),
            step: WizardStep::Details,
            field_index: 0,
            editing: false,
            active_input: String::new(),
            items_list_state: ListState::default(),
            costs_list_state: ListState::default(),
            editing_item: None,
            editing_cost: None,
            show_error: None,
        }
    }

    /// Reopen a stored quote for editing.
    pub fn from_existing(config: &Config, quote: Quote) -> Self {
        let mut state = Self::new(config);

        let mut backend = Vec::new();
        let mut frontend = Vec::new();
        for item in quote.items {
            if BACKEND_CATEGORIES.contains(&item.category.as_str()) {
                backend.push(item);
            } else {
                frontend.push(item);
            }
        }

        state.number = quote.number;
        state.issue_date = DateInput::new(quote.issue_date);
        state.validity_input = quote.validity_days.to_string();
        state.kind = quote.kind;
        state.delivery_suggestion = DeliverySuggestion::seed_from(&quote.delivery_estimate);
        state.delivery = quote.delivery_estimate;
        state.client = quote.client;
        state.project = quote.project;
        state.backend_seq = backend.len() as u32;
        state.frontend_seq = frontend.len() as u32;
        state.backend_items = backend;
        state.frontend_items = frontend;
        state.costs = quote.operational_costs;
        state.revenue_model = quote.revenue_model;
        state.discount_input = if quote.discount == 0.0 {
            String::new()
        } else {
            quote.discount.to_string()
        };
        state.notes = quote.notes;
        state.terms = quote.terms;
        state
    }

    fn current_field(&self) -> QuoteField {
        step_fields(self.step)[self.field_index]
    }

    fn field_text(&self, field: QuoteField) -> String {
        match field {
            QuoteField::Number => self.number.clone(),
            QuoteField::ValidityDays => self.validity_input.clone(),
            QuoteField::Delivery => self.delivery.clone(),
            QuoteField::ClientName => self.client.name.clone(),
            QuoteField::ClientEmail => self.client.email.clone(),
            QuoteField::ClientPhone => self.client.phone.clone(),
            QuoteField::ClientAddress => self.client.address.clone(),
            QuoteField::ClientCompany => self.client.company.clone(),
            QuoteField::ProjectTitle => self.project.title.clone(),
            QuoteField::ProjectIntroduction => self.project.introduction.clone(),
            QuoteField::ProjectDevelopment => self.project.development.clone(),
            QuoteField::ProjectConclusion => self.project.conclusion.clone(),
            QuoteField::RevenueModel => self.revenue_model.clone(),
            QuoteField::Discount => self.discount_input.clone(),
            QuoteField::Notes => self.notes.clone(),
            QuoteField::Terms => self.terms.clone(),
            QuoteField::IssueDate | QuoteField::Kind | QuoteField::Items | QuoteField::Costs => {
                String::new()
            }
        }
    }

    fn store_field(&mut self, field: QuoteField, value: String) {
        match field {
            QuoteField::Number => self.number = value,
            QuoteField::ValidityDays => self.validity_input = value,
            QuoteField::Delivery => self.delivery = value,
            QuoteField::ClientName => self.client.name = value,
            QuoteField::ClientEmail => self.client.email = value,
            QuoteField::ClientPhone => self.client.phone = value,
            QuoteField::ClientAddress => self.client.address = value,
            QuoteField::ClientCompany => self.client.company = value,
            QuoteField::ProjectTitle => self.project.title = value,
            QuoteField::ProjectIntroduction => self.project.introduction = value,
            QuoteField::ProjectDevelopment => self.project.development = value,
            QuoteField::ProjectConclusion => self.project.conclusion = value,
            QuoteField::RevenueModel => self.revenue_model = value,
            QuoteField::Discount => self.discount_input = value,
            QuoteField::Notes => self.notes = value,
            QuoteField::Terms => self.terms = value,
            QuoteField::IssueDate | QuoteField::Kind | QuoteField::Items | QuoteField::Costs => {}
        }
    }

    pub fn toggle_editing(&mut self) {
        self.editing = !self.editing;

        if self.editing {
            match self.current_field() {
                QuoteField::IssueDate => self.issue_date.reset(),
                QuoteField::Items => {
                    let len = self.current_items().len();
                    if len > 0 && self.items_list_state.selected().is_none() {
                        self.items_list_state.select(Some(0));
                    }
                }
                QuoteField::Costs => {
                    if !self.costs.is_empty() && self.costs_list_state.selected().is_none() {
                        self.costs_list_state.select(Some(0));
                    }
                }
                QuoteField::Kind => {}
                field => self.active_input = self.field_text(field),
            }
        } else {
            self.editing_item = None;
            self.editing_cost = None;
            self.active_input.clear();
        }
    }

    pub fn next_field(&mut self) {
        let len = step_fields(self.step).len();
        self.field_index = (self.field_index + 1) % len;
    }

    pub fn previous_field(&mut self) {
        let len = step_fields(self.step).len();
        self.field_index = (self.field_index + len - 1) % len;
    }

    pub fn next_step(&mut self) {
        self.step = self.step.next();
        self.field_index = 0;
    }

    pub fn previous_step(&mut self) {
        self.step = self.step.previous();
        self.field_index = 0;
    }

    fn current_items(&self) -> &Vec<LineItem> {
        match self.step {
            WizardStep::FrontendItems => &self.frontend_items,
            _ => &self.backend_items,
        }
    }

    fn current_categories(&self) -> &'static [&'static str] {
        match self.step {
            WizardStep::FrontendItems => &FRONTEND_CATEGORIES,
            _ => &BACKEND_CATEGORIES,
        }
    }

    /// Every numeric edit lands here: recompute hours and let the
    /// suggestion tracker decide whether the delivery field follows.
    fn refresh_totals(&mut self) {
        let hours: f64 = self
            .backend_items
            .iter()
            .chain(&self.frontend_items)
            .map(|item| item.hours)
            .sum();

        if let Some(text) = self
            .delivery_suggestion
            .refresh(&self.delivery, hours, self.hours_per_week)
        {
            self.delivery = text;
        }
    }

    fn live_totals(&self) -> (f64, f64, f64, f64) {
        let subtotal: f64 = self
            .backend_items
            .iter()
            .chain(&self.frontend_items)
            .map(|item| item.total)
            .sum();
        let hours: f64 = self
            .backend_items
            .iter()
            .chain(&self.frontend_items)
            .map(|item| item.hours)
            .sum();
        let discount = totals::parse_amount(&self.discount_input);
        (subtotal, discount, totals::total(subtotal, discount), hours)
    }

    pub fn add_item(&mut self) {
        let (items, prefix, seq, category) = match self.step {
            WizardStep::BackendItems => (
                &mut self.backend_items,
                "backend",
                &mut self.backend_seq,
                BACKEND_CATEGORIES[0],
            ),
            WizardStep::FrontendItems => (
                &mut self.frontend_items,
                "frontend",
                &mut self.frontend_seq,
                FRONTEND_CATEGORIES[0],
            ),
            _ => return,
        };

        let id = loop {
            *seq += 1;
            let candidate = format!("{}-{}", prefix, seq);
            if !items.iter().any(|item| item.id == candidate) {
                break candidate;
            }
        };

        items.push(LineItem::new(id, category));
        let index = items.len() - 1;
        self.items_list_state.select(Some(index));
        self.editing_item = Some((index, ItemField::Category, String::new()));
    }

    pub fn edit_selected_item(&mut self) {
        if let Some(selected) = self.items_list_state.selected() {
            if selected < self.current_items().len() {
                self.editing_item = Some((selected, ItemField::Category, String::new()));
            }
        }
    }

    pub fn delete_selected_item(&mut self) {
        if let Some(selected) = self.items_list_state.selected() {
            let items = match self.step {
                WizardStep::FrontendItems => &mut self.frontend_items,
                _ => &mut self.backend_items,
            };
            if selected < items.len() {
                items.remove(selected);

                let len = items.len();
                if len > 0 {
                    self.items_list_state
                        .select(Some(selected.min(len - 1)));
                } else {
                    self.items_list_state.select(None);
                }
                self.editing_item = None;
                self.refresh_totals();
            }
        }
    }

    /// Commit the buffered value into the item and advance to its next
    /// field. Totals only move when the committed value actually
    /// changed, which keeps the two recalculation paths exclusive.
    pub fn next_field_in_item(&mut self) {
        let Some((index, field, value)) = self.editing_item.take() else {
            return;
        };

        let items = match self.step {
            WizardStep::FrontendItems => &mut self.frontend_items,
            _ => &mut self.backend_items,
        };
        if index >= items.len() {
            return;
        }
        let item = &mut items[index];

        match field {
            ItemField::Category => {
                self.editing_item =
                    Some((index, ItemField::Description, item.description.clone()));
            }
            ItemField::Description => {
                item.description = value;
                self.editing_item = Some((index, ItemField::Details, item.details.clone()));
            }
            ItemField::Details => {
                item.details = value;
                self.editing_item = Some((index, ItemField::Hours, item.hours.to_string()));
            }
            ItemField::Hours => {
                let hours = totals::parse_amount(&value);
                if hours != item.hours {
                    item.hours = hours;
                    item.recalc_from_time();
                }
                self.editing_item =
                    Some((index, ItemField::HourlyRate, item.hourly_rate.to_string()));
            }
            ItemField::HourlyRate => {
                let rate = totals::parse_amount(&value);
                if rate != item.hourly_rate {
                    item.hourly_rate = rate;
                    item.recalc_from_time();
                }
                self.editing_item =
                    Some((index, ItemField::Quantity, item.quantity.to_string()));
            }
            ItemField::Quantity => {
                let quantity = totals::parse_amount(&value);
                if quantity != item.quantity {
                    item.quantity = quantity;
                    item.recalc_from_units();
                }
                self.editing_item =
                    Some((index, ItemField::UnitPrice, item.unit_price.to_string()));
            }
            ItemField::UnitPrice => {
                let price = totals::parse_amount(&value);
                if price != item.unit_price {
                    item.unit_price = price;
                    item.recalc_from_units();
                }
                self.editing_item = None;
            }
        }

        self.refresh_totals();
    }

    fn cycle_category(&mut self, forward: bool) {
        let (index, field) = match &self.editing_item {
            Some((i, f, _)) => (*i, *f),
            None => return,
        };
        if field != ItemField::Category {
            return;
        }

        let categories = self.current_categories();
        let items = match self.step {
            WizardStep::FrontendItems => &mut self.frontend_items,
            _ => &mut self.backend_items,
        };
        if index >= items.len() {
            return;
        }

        let item = &mut items[index];
        let current = categories
            .iter()
            .position(|c| *c == item.category)
            .unwrap_or(0);
        let next = if forward {
            (current + 1) % categories.len()
        } else {
            (current + categories.len() - 1) % categories.len()
        };
        item.category = categories[next].to_string();
    }

    pub fn add_cost(&mut self) {
        self.costs.push(OperationalCost::default());
        let index = self.costs.len() - 1;
        self.costs_list_state.select(Some(index));
        self.editing_cost = Some((index, CostField::Description, String::new()));
    }

    pub fn edit_selected_cost(&mut self) {
        if let Some(selected) = self.costs_list_state.selected() {
            if selected < self.costs.len() {
                self.editing_cost = Some((
                    selected,
                    CostField::Description,
                    self.costs[selected].description.clone(),
                ));
            }
        }
    }

    pub fn delete_selected_cost(&mut self) {
        if let Some(selected) = self.costs_list_state.selected() {
            if selected < self.costs.len() {
                self.costs.remove(selected);

                if !self.costs.is_empty() {
                    self.costs_list_state
                        .select(Some(selected.min(self.costs.len() - 1)));
                } else {
                    self.costs_list_state.select(None);
                }
                self.editing_cost = None;
            }
        }
    }

    pub fn next_field_in_cost(&mut self) {
        let Some((index, field, value)) = self.editing_cost.take() else {
            return;
        };
        if index >= self.costs.len() {
            return;
        }
        let cost = &mut self.costs[index];

        match field {
            CostField::Description => {
                cost.description = value;
                self.editing_cost = Some((index, CostField::Amount, cost.amount.to_string()));
            }
            CostField::Amount => {
                cost.amount = totals::parse_amount(&value);
                self.editing_cost = Some((index, CostField::Periodicity, String::new()));
            }
            CostField::Periodicity => {
                self.editing_cost = None;
            }
        }
    }

    fn cycle_periodicity(&mut self) {
        if let Some((index, CostField::Periodicity, _)) = &self.editing_cost {
            if let Some(cost) = self.costs.get_mut(*index) {
                cost.periodicity = cost.periodicity.next();
            }
        }
    }

    pub fn edit_current_field(&mut self, key: KeyCode) {
        if !self.editing {
            return;
        }

        match self.current_field() {
            QuoteField::IssueDate => self.issue_date.handle_key(key),
            QuoteField::Items => match key {
                KeyCode::Left => self.cycle_category(false),
                KeyCode::Right => self.cycle_category(true),
                KeyCode::Char(c) => {
                    if let Some((_, field, value)) = &mut self.editing_item {
                        if *field != ItemField::Category {
                            value.push(c);
                        }
                    }
                }
                KeyCode::Backspace => {
                    if let Some((_, _, value)) = &mut self.editing_item {
                        value.pop();
                    }
                }
                _ => {}
            },
            QuoteField::Costs => match key {
                KeyCode::Left | KeyCode::Right => self.cycle_periodicity(),
                KeyCode::Char(c) => {
                    if let Some((_, field, value)) = &mut self.editing_cost {
                        if *field != CostField::Periodicity {
                            value.push(c);
                        }
                    }
                }
                KeyCode::Backspace => {
                    if let Some((_, _, value)) = &mut self.editing_cost {
                        value.pop();
                    }
                }
                _ => {}
            },
            QuoteField::Kind => {}
            _ => match key {
                KeyCode::Char(c) => self.active_input.push(c),
                KeyCode::Backspace => {
                    self.active_input.pop();
                }
                _ => {}
            },
        }
    }

    /// Build the finalized quote record from the form state.
    pub fn to_quote(&self) -> Quote {
        let mut items: Vec<LineItem> = Vec::new();
        items.extend(
            self.backend_items
                .iter()
                .filter(|item| !item.description.trim().is_empty())
                .cloned(),
        );
        items.extend(
            self.frontend_items
                .iter()
                .filter(|item| !item.description.trim().is_empty())
                .cloned(),
        );

        let costs: Vec<OperationalCost> = self
            .costs
            .iter()
            .filter(|cost| !cost.description.trim().is_empty())
            .cloned()
            .collect();

        let subtotal = totals::subtotal(&items);
        let discount = totals::parse_amount(&self.discount_input);

        let number = if self.number.trim().is_empty() {
            format!("QTE-{}", Local::now().format("%Y%m%d%H%M%S"))
        } else {
            self.number.trim().to_string()
        };

        let terms = if self.terms.trim().is_empty() {
            DEFAULT_TERMS.to_string()
        } else {
            self.terms.clone()
        };

        Quote {
            number,
            issue_date: self.issue_date.date,
            validity_days: totals::parse_amount(&self.validity_input) as u32,
            delivery_estimate: self.delivery.trim().to_string(),
            kind: self.kind,
            client: self.client.clone(),
            project: self.project.clone(),
            operational_costs: costs,
            revenue_model: self.revenue_model.clone(),
            notes: self.notes.clone(),
            terms,
            subtotal,
            discount,
            total: totals::total(subtotal, discount),
            total_hours: totals::total_hours(&items),
            items,
        }
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.show_error = Some(message.into());
    }

    pub fn is_valid(&self) -> bool {
        let has_item = self
            .backend_items
            .iter()
            .chain(&self.frontend_items)
            .any(|item| !item.description.trim().is_empty());

        !self.client.name.trim().is_empty() && has_item
    }
}

pub enum QuoteWizardAction {
    Cancel,
    SaveDraft(Quote),
    Generate(Quote),
}

pub fn render_quote_wizard<B: Backend>(frame: &mut Frame<B>, state: &mut QuoteWizardState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints(
            [
                Constraint::Length(3), // Title
                Constraint::Min(10),   // Form
                Constraint::Length(3), // Totals
                Constraint::Length(3), // Help
            ]
            .as_ref(),
        )
        .split(frame.size());

    let title = Paragraph::new(format!(
        "Quote Wizard — {} ({}/{})",
        state.step.title(),
        state.step.position() + 1,
        STEPS.len()
    ))
    .style(Style::default().fg(Color::Cyan))
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(title, chunks[0]);

    match state.step {
        WizardStep::BackendItems | WizardStep::FrontendItems => {
            render_items(frame, state, chunks[1])
        }
        WizardStep::Costs => render_costs(frame, state, chunks[1]),
        _ => render_fields(frame, state, chunks[1]),
    }

    let (subtotal, discount, total, hours) = state.live_totals();
    let delivery = if state.delivery.trim().is_empty() {
        "-".to_string()
    } else {
        state.delivery.clone()
    };
    let totals_line = Paragraph::new(format!(
        "Subtotal: ${:.2} | Discount: ${:.2} | Total: ${:.2} | Hours: {}h | Delivery: {}",
        subtotal, discount, total, hours, delivery
    ))
    .style(Style::default().fg(Color::Magenta))
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(totals_line, chunks[2]);

    let help_text = help_text(state);
    let help = Paragraph::new(help_text)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(help, chunks[3]);

    if let Some(error) = &state.show_error {
        render_error(frame, frame.size(), error);
    }
}

fn help_text(state: &QuoteWizardState) -> &'static str {
    let in_list_step = matches!(
        state.step,
        WizardStep::BackendItems | WizardStep::FrontendItems | WizardStep::Costs
    );

    if !state.editing {
        return "Enter - Edit | Up/Down - Field | Left/Right - Step | S - Save draft | G - Generate | Esc - Back";
    }

    if in_list_step {
        if state.editing_item.is_some() || state.editing_cost.is_some() {
            return "Enter/Tab - Next field | Left/Right - Cycle choice | Esc - Done";
        }
        return "A - Add | E - Edit | D - Delete | Up/Down - Select | Enter - Done";
    }

    match state.current_field() {
        QuoteField::IssueDate => "Left/Right - Part | Up/Down - Step | Digits - Type | Enter - Save",
        _ => "Enter - Save field | Esc - Cancel editing",
    }
}

fn render_fields<B: Backend>(frame: &mut Frame<B>, state: &mut QuoteWizardState, area: Rect) {
    let fields = step_fields(state.step);
    let tall = |field: &QuoteField| {
        matches!(
            field,
            QuoteField::ProjectIntroduction
                | QuoteField::ProjectDevelopment
                | QuoteField::ProjectConclusion
                | QuoteField::RevenueModel
                | QuoteField::Notes
                | QuoteField::Terms
        )
    };

    let constraints: Vec<Constraint> = fields
        .iter()
        .map(|f| {
            if tall(f) {
                Constraint::Length(4)
            } else {
                Constraint::Length(3)
            }
        })
        .chain(std::iter::once(Constraint::Min(0)))
        .collect();

    let field_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    for (i, field) in fields.iter().enumerate() {
        let selected = state.field_index == i;
        let editing = selected && state.editing;
        let label_style = if selected {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };

        let widget = match field {
            QuoteField::IssueDate => Paragraph::new(Spans::from(
                std::iter::once(Span::styled("Issue Date: ", label_style))
                    .chain(state.issue_date.spans(editing).0)
                    .collect::<Vec<Span>>(),
            ))
            .block(Block::default().borders(Borders::ALL)),
            QuoteField::Kind => Paragraph::new(Spans::from(vec![
                Span::styled("Type: ", label_style),
                Span::raw(state.kind.to_string()),
                Span::styled("  (Enter toggles)", Style::default().fg(Color::DarkGray)),
            ]))
            .block(Block::default().borders(Borders::ALL)),
            field if tall(field) => {
                let value = if editing {
                    format!("{}|", state.active_input)
                } else {
                    state.field_text(*field)
                };
                Paragraph::new(value)
                    .wrap(Wrap { trim: false })
                    .block(
                        Block::default()
                            .title(Span::styled(field_label(*field), label_style))
                            .borders(Borders::ALL),
                    )
            }
            field => {
                let value = if editing {
                    format!("{}|", state.active_input)
                } else {
                    state.field_text(*field)
                };
                Paragraph::new(Spans::from(vec![
                    Span::styled(format!("{}: ", field_label(*field)), label_style),
                    Span::raw(value),
                ]))
                .block(Block::default().borders(Borders::ALL))
            }
        };

        frame.render_widget(widget, field_chunks[i]);
    }
}

fn field_label(field: QuoteField) -> &'static str {
    match field {
        QuoteField::Number => "Quote Number",
        QuoteField::IssueDate => "Issue Date",
        QuoteField::ValidityDays => "Validity (days)",
        QuoteField::Kind => "Type",
        QuoteField::Delivery => "Delivery Estimate",
        QuoteField::ClientName => "Name / Company",
        QuoteField::ClientEmail => "Email",
        QuoteField::ClientPhone => "Phone",
        QuoteField::ClientAddress => "Address",
        QuoteField::ClientCompany => "Company",
        QuoteField::ProjectTitle => "Project Title",
        QuoteField::ProjectIntroduction => "Introduction / Overview",
        QuoteField::ProjectDevelopment => "Development",
        QuoteField::ProjectConclusion => "Conclusion",
        QuoteField::Items => "Items",
        QuoteField::Costs => "Operational Costs",
        QuoteField::RevenueModel => "Revenue Model",
        QuoteField::Discount => "Discount",
        QuoteField::Notes => "Additional Notes",
        QuoteField::Terms => "Terms & Conditions",
    }
}

fn render_items<B: Backend>(frame: &mut Frame<B>, state: &mut QuoteWizardState, area: Rect) {
    let group_hours: f64 = state.current_items().iter().map(|item| item.hours).sum();
    let block = Block::default()
        .title(format!("{} — {}h", state.step.title(), group_hours))
        .borders(Borders::ALL)
        .style(if state.editing {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        });

    if let Some((index, active_field, value)) = state.editing_item.clone() {
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let Some(item) = state.current_items().get(index) else {
            return;
        };

        let line = |field: ItemField, label: &str, stored: String| -> Spans<'static> {
            let style = if field == active_field {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            let shown = if field == active_field {
                if field == ItemField::Category {
                    format!("< {} >", stored)
                } else {
                    format!("{}|", value)
                }
            } else {
                stored
            };
            Spans::from(vec![
                Span::raw(format!("{:<13}", format!("{}:", label))),
                Span::styled(shown, style),
            ])
        };

        let editor = Paragraph::new(vec![
            line(ItemField::Category, "Category", item.category.clone()),
            line(ItemField::Description, "Description", item.description.clone()),
            line(ItemField::Details, "Details", item.details.clone()),
            line(ItemField::Hours, "Hours", item.hours.to_string()),
            line(ItemField::HourlyRate, "Rate ($/h)", item.hourly_rate.to_string()),
            line(ItemField::Quantity, "Quantity", item.quantity.to_string()),
            line(ItemField::UnitPrice, "Unit ($)", item.unit_price.to_string()),
            Spans::from(""),
            Spans::from(format!("Line total: ${:.2}", item.total)),
        ]);
        frame.render_widget(editor, inner);
    } else {
        let items: Vec<ListItem> = state
            .current_items()
            .iter()
            .map(|item| {
                let description = if item.description.is_empty() {
                    "(new item)"
                } else {
                    item.description.as_str()
                };
                ListItem::new(format!(
                    "[{}] {}: {}h @ ${:.2} (${:.2})",
                    item.category, description, item.hours, item.hourly_rate, item.total
                ))
            })
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().bg(Color::Blue).fg(Color::White));
        frame.render_stateful_widget(list, area, &mut state.items_list_state);
    }
}

fn render_costs<B: Backend>(frame: &mut Frame<B>, state: &mut QuoteWizardState, area: Rect) {
    let block = Block::default()
        .title("Operational Costs")
        .borders(Borders::ALL)
        .style(if state.editing {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        });

    if let Some((index, active_field, value)) = state.editing_cost.clone() {
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let Some(cost) = state.costs.get(index) else {
            return;
        };

        let line = |field: CostField, label: &str, stored: String| -> Spans<'static> {
            let style = if field == active_field {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            let shown = if field == active_field {
                if field == CostField::Periodicity {
                    format!("< {} >", stored)
                } else {
                    format!("{}|", value)
                }
            } else {
                stored
            };
            Spans::from(vec![
                Span::raw(format!("{:<13}", format!("{}:", label))),
                Span::styled(shown, style),
            ])
        };

        let editor = Paragraph::new(vec![
            line(CostField::Description, "Description", cost.description.clone()),
            line(CostField::Amount, "Amount ($)", cost.amount.to_string()),
            line(CostField::Periodicity, "Periodicity", cost.periodicity.to_string()),
        ]);
        frame.render_widget(editor, inner);
    } else {
        let costs: Vec<ListItem> = state
            .costs
            .iter()
            .map(|cost| {
                let description = if cost.description.is_empty() {
                    "(new cost)"
                } else {
                    cost.description.as_str()
                };
                ListItem::new(format!(
                    "{} ({}): ${:.2}",
                    description, cost.periodicity, cost.amount
                ))
            })
            .collect();

        let list = List::new(costs)
            .block(block)
            .highlight_style(Style::default().bg(Color::Blue).fg(Color::White));
        frame.render_stateful_widget(list, area, &mut state.costs_list_state);
    }
}

fn render_error<B: Backend>(frame: &mut Frame<B>, size: Rect, error: &str) {
    let popup_area = centered_rect(60, 20, size);

    let error_msg = Paragraph::new(vec![
        Spans::from(""),
        Spans::from(error.to_string()),
        Spans::from(""),
        Spans::from("Press any key to continue"),
    ])
    .block(Block::default().title("Error").borders(Borders::ALL))
    .style(Style::default().fg(Color::Red));

    frame.render_widget(error_msg, popup_area);
}

pub fn handle_input(state: &mut QuoteWizardState) -> Result<Option<QuoteWizardAction>> {
    // Clear any existing error message
    state.show_error = None;

    if let Event::Key(key) = event::read()? {
        let in_list_step = matches!(
            state.step,
            WizardStep::BackendItems | WizardStep::FrontendItems | WizardStep::Costs
        );
        let in_entry_editor = state.editing_item.is_some() || state.editing_cost.is_some();

        match key.code {
            KeyCode::Esc => {
                if in_entry_editor {
                    state.editing_item = None;
                    state.editing_cost = None;
                } else if state.editing {
                    state.toggle_editing();
                } else {
                    return Ok(Some(QuoteWizardAction::Cancel));
                }
            }
            KeyCode::Enter => {
                if state.editing {
                    match state.current_field() {
                        QuoteField::Items => {
                            if state.editing_item.is_some() {
                                state.next_field_in_item();
                            } else {
                                state.toggle_editing();
                            }
                        }
                        QuoteField::Costs => {
                            if state.editing_cost.is_some() {
                                state.next_field_in_cost();
                            } else {
                                state.toggle_editing();
                            }
                        }
                        QuoteField::IssueDate => state.toggle_editing(),
                        field => {
                            let value = std::mem::take(&mut state.active_input);
                            state.store_field(field, value);
                            state.refresh_totals();
                            state.editing = false;
                        }
                    }
                } else if state.current_field() == QuoteField::Kind {
                    state.kind = state.kind.toggle();
                } else {
                    state.toggle_editing();
                }
            }
            KeyCode::Char('s') if !state.editing => {
                return Ok(Some(QuoteWizardAction::SaveDraft(state.to_quote())));
            }
            KeyCode::Char('g') if !state.editing => {
                if state.is_valid() {
                    return Ok(Some(QuoteWizardAction::Generate(state.to_quote())));
                } else {
                    state.show_error = Some(
                        "A client name and at least one described item are required.".to_string(),
                    );
                }
            }
            KeyCode::Char('a') if in_list_step && state.editing && !in_entry_editor => {
                if state.step == WizardStep::Costs {
                    state.add_cost();
                } else {
                    state.add_item();
                }
            }
            KeyCode::Char('e') if in_list_step && state.editing && !in_entry_editor => {
                if state.step == WizardStep::Costs {
                    state.edit_selected_cost();
                } else {
                    state.edit_selected_item();
                }
            }
            KeyCode::Char('d') if in_list_step && state.editing && !in_entry_editor => {
                if state.step == WizardStep::Costs {
                    state.delete_selected_cost();
                } else {
                    state.delete_selected_item();
                }
            }
            KeyCode::Tab if in_entry_editor => {
                if state.editing_item.is_some() {
                    state.next_field_in_item();
                } else {
                    state.next_field_in_cost();
                }
            }
            KeyCode::Up if !state.editing => state.previous_field(),
            KeyCode::Down if !state.editing => state.next_field(),
            KeyCode::Left if !state.editing => state.previous_step(),
            KeyCode::Right if !state.editing => state.next_step(),
            KeyCode::Up if in_list_step && state.editing && !in_entry_editor => {
                let len = if state.step == WizardStep::Costs {
                    state.costs.len()
                } else {
                    state.current_items().len()
                };
                let list_state = if state.step == WizardStep::Costs {
                    &mut state.costs_list_state
                } else {
                    &mut state.items_list_state
                };
                if len > 0 {
                    let i = match list_state.selected() {
                        Some(i) if i == 0 => len - 1,
                        Some(i) => i - 1,
                        None => 0,
                    };
                    list_state.select(Some(i));
                }
            }
            KeyCode::Down if in_list_step && state.editing && !in_entry_editor => {
                let len = if state.step == WizardStep::Costs {
                    state.costs.len()
                } else {
                    state.current_items().len()
                };
                let list_state = if state.step == WizardStep::Costs {
                    &mut state.costs_list_state
                } else {
                    &mut state.items_list_state
                };
                if len > 0 {
                    let i = match list_state.selected() {
                        Some(i) if i >= len - 1 => 0,
                        Some(i) => i + 1,
                        None => 0,
                    };
                    list_state.select(Some(i));
                }
            }
            _ if state.editing => {
                state.edit_current_field(key.code);
            }
            _ => {}
        }
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wizard() -> QuoteWizardState {
        QuoteWizardState::new(&Config::default())
    }

    fn wizard_with_item(hours: f64, rate: f64) -> QuoteWizardState {
        let mut state = wizard();
        state.client.name = "Acme".to_string();
        let item = &mut state.backend_items[0];
        item.description = "API".to_string();
        item.hours = hours;
        item.hourly_rate = rate;
        item.recalc_from_time();
        state.refresh_totals();
        state
    }

    #[test]
    fn finalizing_drops_blank_items_and_sums_totals() {
        let mut state = wizard_with_item(40.0, 100.0);
        state.discount_input = "500".to_string();

        let quote = state.to_quote();
        // The untouched frontend placeholder has no description.
        assert_eq!(quote.items.len(), 1);
        assert_eq!(quote.subtotal, 4000.0);
        assert_eq!(quote.discount, 500.0);
        assert_eq!(quote.total, 3500.0);
        assert_eq!(quote.total_hours, 40.0);
    }

    #[test]
    fn finalizing_defaults_number_and_terms() {
        let state = wizard_with_item(8.0, 50.0);
        let quote = state.to_quote();

        assert!(quote.number.starts_with("QTE-"));
        assert_eq!(quote.terms, DEFAULT_TERMS);
    }

    #[test]
    fn numeric_edits_refresh_the_delivery_suggestion() {
        let mut state = wizard_with_item(80.0, 100.0);
        assert_eq!(state.delivery, "2 weeks");

        state.backend_items[0].hours = 130.0;
        state.backend_items[0].recalc_from_time();
        state.refresh_totals();
        assert_eq!(state.delivery, "4 weeks");
    }

    #[test]
    fn manual_delivery_text_survives_recomputation() {
        let mut state = wizard_with_item(80.0, 100.0);
        state.delivery = "12 weeks, phased rollout".to_string();

        state.backend_items[0].hours = 200.0;
        state.backend_items[0].recalc_from_time();
        state.refresh_totals();
        assert_eq!(state.delivery, "12 weeks, phased rollout");
    }

    #[test]
    fn validation_requires_client_and_one_item() {
        let mut state = wizard();
        assert!(!state.is_valid());

        state.client.name = "Acme".to_string();
        assert!(!state.is_valid());

        state.backend_items[0].description = "API".to_string();
        assert!(state.is_valid());
    }

    #[test]
    fn existing_quotes_split_items_back_into_groups() {
        let mut quote = Quote::default();
        quote.number = "QTE-7".to_string();
        let mut api = LineItem::new("backend-1", "REST API");
        api.description = "api".to_string();
        let mut ui = LineItem::new("frontend-1", "Web Interface");
        ui.description = "ui".to_string();
        let mut custom = LineItem::new("x-1", "Bespoke Work");
        custom.description = "misc".to_string();
        quote.items = vec![api, ui, custom];

        let state = QuoteWizardState::from_existing(&Config::default(), quote);
        assert_eq!(state.backend_items.len(), 1);
        // Unknown categories follow the frontend group, as in the report.
        assert_eq!(state.frontend_items.len(), 2);
    }

    #[test]
    fn added_items_get_fresh_group_ids() {
        let mut state = wizard();
        state.step = WizardStep::BackendItems;
        state.add_item();

        assert_eq!(state.backend_items.len(), 2);
        assert_eq!(state.backend_items[1].id, "backend-2");
        assert!(state.editing_item.is_some());
    }
}
