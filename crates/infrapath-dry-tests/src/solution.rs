// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Resource graph builder for tests.
use infrapath_core::{
    EdgeData, PropertyValue, Properties, ResolveError, ResolveResult, Resource, ResourceGraph,
    ResourceId,
};

/// Fluent [`ResourceGraph`] construction. Failures are collected and the
/// first one is returned by [`GraphBuilder::build`].
#[derive(Debug, Default)]
pub struct GraphBuilder {
    graph: ResourceGraph,
    errors: Vec<ResolveError>,
}

impl GraphBuilder {
    /// Empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a resource with no properties.
    #[must_use]
    pub fn resource(self, id: ResourceId) -> Self {
        self.with_resource(Resource::new(id))
    }

    /// Adds a resource with a single property set.
    #[must_use]
    pub fn resource_with(mut self, id: ResourceId, path: &str, value: PropertyValue) -> Self {
        let mut properties = Properties::new();
        if let Err(err) = properties.set(path, value) {
            self.errors.push(ResolveError::property(&id, err));
        }
        self.with_resource(Resource::new(id).with_properties(properties))
    }

    /// Adds a fully built resource.
    #[must_use]
    pub fn with_resource(mut self, resource: Resource) -> Self {
        self.graph.upsert_resource(resource);
        self
    }

    /// Adds `source -> target`; both must already be added.
    #[must_use]
    pub fn edge(self, source: &ResourceId, target: &ResourceId) -> Self {
        self.edge_with(source, target, EdgeData::default())
    }

    /// Adds `source -> target` carrying `data`.
    #[must_use]
    pub fn edge_with(mut self, source: &ResourceId, target: &ResourceId, data: EdgeData) -> Self {
        if let Err(err) = self.graph.add_edge_with_data(source, target, data) {
            self.errors.push(err);
        }
        self
    }

    /// The graph, or the first recorded failure.
    pub fn build(self) -> ResolveResult<ResourceGraph> {
        match self.errors.into_iter().next() {
            Some(err) => Err(err),
            None => Ok(self.graph),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::kb::rid;

    #[test]
    fn edges_need_both_endpoints() {
        let a = rid("vpc", "main");
        let err = GraphBuilder::new()
            .resource(a.clone())
            .edge(&a, &rid("subnet", "x"))
            .build()
            .unwrap_err();
        assert_eq!(err, ResolveError::MissingResource(rid("subnet", "x")));
    }

    #[test]
    fn properties_are_stored() {
        let role = rid("iam_role", "r");
        let graph = GraphBuilder::new()
            .resource_with(rid("lambda_function", "f"), "role", role.clone().into())
            .build()
            .unwrap();
        let f = graph.resource(&rid("lambda_function", "f")).unwrap();
        assert!(f.properties.require("role").unwrap().references(&role));
    }
}
