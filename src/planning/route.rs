//! Routes and the cumulative route plan

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::core::types::TerritoryId;

/// An attack path: launched from the first territory, each following
/// territory reachable from its predecessor
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Route(pub Vec<TerritoryId>);

impl Route {
    pub fn new(territories: Vec<TerritoryId>) -> Self {
        Self(territories)
    }

    pub fn single(territory: TerritoryId) -> Self {
        Self(vec![territory])
    }

    pub fn start(&self) -> TerritoryId {
        self.0[0]
    }

    pub fn end(&self) -> TerritoryId {
        self.0[self.0.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Garrison markers have nothing to attack
    pub fn is_attack(&self) -> bool {
        self.0.len() > 1
    }

    /// Territories conquered along the route
    pub fn targets(&self) -> &[TerritoryId] {
        if self.0.is_empty() {
            &[]
        } else {
            &self.0[1..]
        }
    }

    pub fn contains(&self, territory: TerritoryId) -> bool {
        self.0.contains(&territory)
    }

    pub fn territories(&self) -> &[TerritoryId] {
        &self.0
    }
}

/// Every route committed this turn, in execution order
///
/// A route may start on a territory that an earlier route conquers; such a
/// route is a fork of the earlier one. Forks are always queued after their
/// parent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoutePlan {
    routes: VecDeque<Route>,
}

impl RoutePlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, route: Route) {
        self.routes.push_back(route);
    }

    pub fn extend(&mut self, routes: impl IntoIterator<Item = Route>) {
        self.routes.extend(routes);
    }

    pub fn pop_front(&mut self) -> Option<Route> {
        self.routes.pop_front()
    }

    pub fn clear(&mut self) {
        self.routes.clear();
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }

    /// Pending routes launched from `territory`
    pub fn forks_from(&self, territory: TerritoryId) -> impl Iterator<Item = &Route> {
        self.routes
            .iter()
            .filter(move |r| r.is_attack() && r.start() == territory)
    }

    /// The route that conquers `territory`, if any
    pub fn conqueror_of(&self, territory: TerritoryId) -> Option<&Route> {
        self.routes.iter().find(|r| r.targets().contains(&territory))
    }

    /// Every territory conquered by some pending route
    pub fn targets(&self) -> impl Iterator<Item = TerritoryId> + '_ {
        self.routes.iter().flat_map(|r| r.targets().iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(ids: &[u32]) -> Route {
        Route::new(ids.iter().map(|&i| TerritoryId(i)).collect())
    }

    #[test]
    fn test_route_accessors() {
        let r = route(&[1, 2, 3]);
        assert_eq!(r.start(), TerritoryId(1));
        assert_eq!(r.end(), TerritoryId(3));
        assert_eq!(r.targets(), &[TerritoryId(2), TerritoryId(3)]);
        assert!(r.is_attack());
        assert!(!Route::single(TerritoryId(5)).is_attack());
    }

    #[test]
    fn test_plan_forks_and_conquerors() {
        let mut plan = RoutePlan::new();
        plan.push(route(&[1, 2, 3]));
        plan.push(route(&[2, 4]));
        plan.push(route(&[2]));

        let forks: Vec<_> = plan.forks_from(TerritoryId(2)).collect();
        assert_eq!(forks.len(), 1);
        assert_eq!(plan.conqueror_of(TerritoryId(4)), Some(&route(&[2, 4])));
        assert!(plan.conqueror_of(TerritoryId(1)).is_none());

        assert_eq!(plan.pop_front(), Some(route(&[1, 2, 3])));
        assert_eq!(plan.len(), 2);
    }
}
