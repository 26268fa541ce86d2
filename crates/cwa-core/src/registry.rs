//! Vehicle to route assignments.

use std::collections::HashMap;

/// First-write-wins mapping from vehicle id to route id.
#[derive(Debug, Clone, Default)]
pub struct RouteAssignmentRegistry {
    routes: HashMap<String, String>,
    /// Vehicle ids in the order they were first assigned
    order: Vec<String>,
}

impl RouteAssignmentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a route if the vehicle has none yet. Returns whether it took effect.
    pub fn assign(&mut self, vehicle_id: &str, route_id: &str) -> bool {
        if self.routes.contains_key(vehicle_id) {
            return false;
        }
        self.routes
            .insert(vehicle_id.to_string(), route_id.to_string());
        self.order.push(vehicle_id.to_string());
        true
    }

    pub fn route_of(&self, vehicle_id: &str) -> Option<&str> {
        self.routes.get(vehicle_id).map(String::as_str)
    }

    /// Iterate `(vehicle_id, route_id)` in first-assignment order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.order.iter().filter_map(move |vehicle_id| {
            self.routes
                .get(vehicle_id)
                .map(|route_id| (vehicle_id.as_str(), route_id.as_str()))
        })
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_assignment_wins() {
        let mut registry = RouteAssignmentRegistry::new();
        assert!(registry.assign("veh_0", "R1"));
        assert!(!registry.assign("veh_0", "R2"));
        assert_eq!(registry.route_of("veh_0"), Some("R1"));
        assert_eq!(registry.route_of("veh_1"), None);
    }

    #[test]
    fn assignments_iterate_in_first_assignment_order() {
        let mut registry = RouteAssignmentRegistry::new();
        registry.assign("c", "2");
        registry.assign("a", "0");
        registry.assign("c", "5");
        registry.assign("b", "1");

        let order: Vec<(&str, &str)> = registry.iter().collect();
        assert_eq!(order, vec![("c", "2"), ("a", "0"), ("b", "1")]);
        assert_eq!(registry.len(), 3);
    }
}
