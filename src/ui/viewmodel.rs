//! View model types representing the renderable dashboard.
//!
//! View models are created by [`AppState::compute_viewmodel`](crate::app::AppState::compute_viewmodel)
//! and consumed by the renderer. Every value is already formatted for display.

/// The whole dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardViewModel {
    pub header: HeaderInfo,
    pub stats: QuickStats,
    /// One card per vehicle, in vehicle order.
    pub cards: Vec<VehicleCard>,
    /// Set when the user has no vehicles.
    pub empty_state: Option<EmptyState>,
    /// Whether the add-fillup action is available.
    pub can_add_fillup: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderInfo {
    pub title: String,
    /// `Welcome, <email>` when the session carries an email.
    pub greeting: Option<String>,
}

/// Totals across every vehicle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuickStats {
    pub vehicles: usize,
    pub fillups: usize,
    /// Sum of all fillup costs, e.g. `₹1235`.
    pub total_spent: String,
}

/// Summary and chronological log of one vehicle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VehicleCard {
    pub id: String,
    /// `name (model)`.
    pub title: String,
    pub fillup_count: usize,
    /// Average mileage in km/l, when it can be computed.
    pub average: Option<String>,
    pub lines: Vec<FillupLine>,
    /// Set when the vehicle has no fillups.
    pub empty_message: Option<String>,
}

/// One row of a vehicle's fillup table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FillupLine {
    pub id: String,
    pub date: String,
    pub odometer: u32,
    pub liters: String,
    pub cost: String,
    /// Mileage since the previous fillup, or `N/A`.
    pub mileage: String,
    /// Pump name, or `Not specified`.
    pub pump: String,
}

/// Message shown in place of the vehicle list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmptyState {
    pub message: String,
    pub hint: String,
}
