//! Medicine catalog and mock order data
//!
//! The catalog is loaded once at startup and never mutated. Lookups are
//! case-insensitive substring matches over display names; ties resolve to
//! the first entry in declaration order.

use serde::{Deserialize, Serialize};

/// Therapeutic category for library filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Heart,
    Diabetes,
    Pain,
    Stomach,
    General,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Heart,
        Category::Diabetes,
        Category::Pain,
        Category::Stomach,
        Category::General,
    ];
}

/// A catalog entry. Immutable after load; `stock` reflects the seeded
/// inventory and is never decremented by order placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Medicine {
    pub id: String,
    pub name: String,
    pub dosage: String,
    pub description: String,
    pub usage: String,
    pub side_effects: String,
    pub stock: u32,
    pub unit: String,
    pub prescription_required: bool,
    pub price: f64,
    pub category: Category,
}

/// Delivery status of a past order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Delivered,
    Pending,
    Cancelled,
    Processing,
}

/// A past order in the user's history (static mock data)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
    pub id: String,
    pub medicine_id: String,
    pub medicine_name: String,
    pub quantity: u32,
    pub date: String,
    pub status: OrderStatus,
    pub price: f64,
}

/// Upcoming refill reminder shown on the home screen
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefillAlert {
    pub id: String,
    pub medicine_name: String,
    pub user_name: String,
    pub days_remaining: u32,
}

/// Read-only medicine reference data plus the mock order history.
pub struct Catalog {
    medicines: Vec<Medicine>,
    history: Vec<OrderRecord>,
    refill_alerts: Vec<RefillAlert>,
}

impl Catalog {
    /// Build the catalog from the static seed data.
    pub fn seed() -> Self {
        Self {
            medicines: seed_medicines(),
            history: seed_history(),
            refill_alerts: seed_refill_alerts(),
        }
    }

    pub fn medicines(&self) -> &[Medicine] {
        &self.medicines
    }

    pub fn history(&self) -> &[OrderRecord] {
        &self.history
    }

    pub fn refill_alerts(&self) -> &[RefillAlert] {
        &self.refill_alerts
    }

    /// Case-insensitive substring match over display names. Multiple
    /// matches resolve to the first entry in declaration order.
    pub fn find_by_name(&self, query: &str) -> Option<&Medicine> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        self.medicines
            .iter()
            .find(|m| m.name.to_lowercase().contains(&needle))
    }

    /// Library listing: optional name filter (substring, case-insensitive)
    /// and optional category filter, both applied in declaration order.
    pub fn search(&self, name: Option<&str>, category: Option<Category>) -> Vec<&Medicine> {
        let needle = name.map(|n| n.trim().to_lowercase());
        self.medicines
            .iter()
            .filter(|m| match &needle {
                Some(n) if !n.is_empty() => m.name.to_lowercase().contains(n),
                _ => true,
            })
            .filter(|m| category.is_none_or(|c| m.category == c))
            .collect()
    }
}

fn seed_medicines() -> Vec<Medicine> {
    vec![
        Medicine {
            id: "1".to_string(),
            name: "Amlodipine".to_string(),
            dosage: "5mg".to_string(),
            description: "A calcium channel blocker used to treat high blood pressure (hypertension)."
                .to_string(),
            usage: "Take once daily at the same time, with or without food.".to_string(),
            side_effects: "Swelling of feet or ankles, dizziness, or headache.".to_string(),
            stock: 150,
            unit: "tablets".to_string(),
            prescription_required: true,
            price: 120.0,
            category: Category::Heart,
        },
        Medicine {
            id: "2".to_string(),
            name: "Metformin".to_string(),
            dosage: "500mg".to_string(),
            description: "An oral diabetes medicine that helps control blood sugar levels."
                .to_string(),
            usage: "Take with meals as directed by your doctor.".to_string(),
            side_effects: "Nausea, stomach upset, or metallic taste in mouth.".to_string(),
            stock: 200,
            unit: "tablets".to_string(),
            prescription_required: true,
            price: 85.0,
            category: Category::Diabetes,
        },
        Medicine {
            id: "3".to_string(),
            name: "Paracetamol".to_string(),
            dosage: "650mg".to_string(),
            description: "Commonly used to treat fever and mild to moderate pain.".to_string(),
            usage: "Maximum 4g per day. Do not exceed the recommended dose.".to_string(),
            side_effects: "Generally safe, but excessive use can harm the liver.".to_string(),
            stock: 500,
            unit: "tablets".to_string(),
            prescription_required: false,
            price: 30.0,
            category: Category::General,
        },
        Medicine {
            id: "4".to_string(),
            name: "Atorvastatin".to_string(),
            dosage: "10mg".to_string(),
            description: "Used along with diet to lower cholesterol and reduce risk of heart attack."
                .to_string(),
            usage: "Usually taken once a day, with or without food.".to_string(),
            side_effects: "Joint pain, diarrhea, or muscle soreness.".to_string(),
            stock: 80,
            unit: "tablets".to_string(),
            prescription_required: true,
            price: 210.0,
            category: Category::Heart,
        },
        Medicine {
            id: "5".to_string(),
            name: "Pantoprazole".to_string(),
            dosage: "40mg".to_string(),
            description: "A proton pump inhibitor that decreases the amount of acid produced in the stomach."
                .to_string(),
            usage: "Take 30-60 minutes before breakfast.".to_string(),
            side_effects: "Headache, diarrhea, or flatulence.".to_string(),
            stock: 120,
            unit: "capsules".to_string(),
            prescription_required: false,
            price: 95.0,
            category: Category::Stomach,
        },
    ]
}

fn seed_history() -> Vec<OrderRecord> {
    vec![
        OrderRecord {
            id: "o1".to_string(),
            medicine_id: "1".to_string(),
            medicine_name: "Amlodipine".to_string(),
            quantity: 30,
            date: "2024-04-15".to_string(),
            status: OrderStatus::Delivered,
            price: 120.0,
        },
        OrderRecord {
            id: "o2".to_string(),
            medicine_id: "2".to_string(),
            medicine_name: "Metformin".to_string(),
            quantity: 60,
            date: "2024-03-20".to_string(),
            status: OrderStatus::Delivered,
            price: 170.0,
        },
    ]
}

fn seed_refill_alerts() -> Vec<RefillAlert> {
    vec![
        RefillAlert {
            id: "ra1".to_string(),
            medicine_name: "Amlodipine".to_string(),
            user_name: "Rahul Sharma".to_string(),
            days_remaining: 3,
        },
        RefillAlert {
            id: "ra2".to_string(),
            medicine_name: "Metformin".to_string(),
            user_name: "Rahul Sharma".to_string(),
            days_remaining: 7,
        },
    ]
}
