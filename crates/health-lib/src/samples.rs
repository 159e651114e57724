//! Sample health models
//!
//! Ready-made graphs for demos, tests and `hm --sample`.

use crate::graph::EntityGraph;
use crate::models::{Criticality, Dependency, DependencyType, Entity, EntityType};

/// Multi-tier e-commerce platform: 9 entities, 7 dependencies
pub fn ecommerce_model() -> EntityGraph {
    let mut graph = EntityGraph::new(
        "ecommerce-prod",
        "E-Commerce Production",
        "Health model for e-commerce platform",
        "Platform Engineering",
    );

    graph.add_entity(Entity::new(
        "ecommerce-root",
        "E-Commerce Workload",
        EntityType::Workload,
        "Overall e-commerce platform health",
    ));

    graph.add_entity(
        Entity::new(
            "api-service",
            "API Gateway",
            EntityType::Api,
            "REST API serving all client requests",
        )
        .with_parent("ecommerce-root")
        .with_signal("response_time", "api_response_time_p95")
        .with_signal("error_rate", "api_error_rate")
        .with_signal("availability", "api_availability"),
    );

    graph.add_entity(
        Entity::new(
            "product-service",
            "Product Service",
            EntityType::Service,
            "Manages product catalog and information",
        )
        .with_parent("ecommerce-root")
        .with_signal("response_time", "product_response_time")
        .with_signal("error_rate", "product_error_rate"),
    );

    graph.add_entity(
        Entity::new(
            "order-service",
            "Order Service",
            EntityType::Service,
            "Handles order processing and management",
        )
        .with_parent("ecommerce-root")
        .with_signal("response_time", "order_response_time")
        .with_signal("error_rate", "order_error_rate"),
    );

    graph.add_entity(
        Entity::new(
            "payment-service",
            "Payment Service",
            EntityType::Service,
            "Processes payment transactions",
        )
        .with_parent("ecommerce-root")
        .with_signal("availability", "payment_availability")
        .with_signal("error_rate", "payment_error_rate"),
    );

    graph.add_entity(
        Entity::new(
            "product-db",
            "Product Database",
            EntityType::Database,
            "PostgreSQL database for product data",
        )
        .with_parent("product-service")
        .with_resource_id(
            "/subscriptions/{sub}/resourceGroups/{rg}/providers/Microsoft.DBforPostgreSQL/servers/product-db",
        )
        .with_signal("connection_pool", "product_db_conn_pool")
        .with_signal("query_latency", "product_db_latency"),
    );

    graph.add_entity(
        Entity::new(
            "order-db",
            "Order Database",
            EntityType::Database,
            "Database for order data",
        )
        .with_parent("order-service")
        .with_signal("connection_pool", "order_db_conn_pool")
        .with_signal("query_latency", "order_db_latency"),
    );

    graph.add_entity(
        Entity::new(
            "cache-layer",
            "Redis Cache",
            EntityType::Cache,
            "Distributed cache for performance",
        )
        .with_parent("ecommerce-root")
        .with_signal("availability", "cache_availability")
        .with_signal("latency", "cache_latency"),
    );

    graph.add_entity(
        Entity::new(
            "service-bus",
            "Service Bus",
            EntityType::MessageQueue,
            "Azure Service Bus for asynchronous processing",
        )
        .with_parent("ecommerce-root")
        .with_signal("availability", "bus_availability")
        .with_signal("queue_depth", "bus_queue_depth"),
    );

    let edges = [
        ("product-service", "api-service", DependencyType::Direct, Criticality::High),
        ("order-service", "api-service", DependencyType::Direct, Criticality::High),
        ("payment-service", "order-service", DependencyType::Direct, Criticality::Critical),
        ("product-db", "product-service", DependencyType::Direct, Criticality::High),
        ("order-db", "order-service", DependencyType::Direct, Criticality::High),
        ("cache-layer", "product-service", DependencyType::Optional, Criticality::Medium),
        ("service-bus", "order-service", DependencyType::Direct, Criticality::High),
    ];
    for (source, target, dependency_type, criticality) in edges {
        graph.add_dependency(
            Dependency::new(source, target)
                .with_type(dependency_type)
                .with_criticality(criticality),
        );
    }

    graph
}

/// Independent services under one platform root, no dependencies
pub fn microservices_model() -> EntityGraph {
    let mut graph = EntityGraph::new(
        "microservices-prod",
        "Microservices Platform",
        "Health model for microservices architecture",
        "SRE Team",
    );

    graph.add_entity(Entity::new(
        "platform-root",
        "Microservices Platform",
        EntityType::Workload,
        "Overall platform health",
    ));

    let services = [
        ("user-service", "User Service", "Manages user accounts and profiles"),
        ("notification-service", "Notification Service", "Sends notifications"),
        ("analytics-service", "Analytics Service", "Tracks user analytics"),
    ];
    for (id, name, description) in services {
        graph.add_entity(
            Entity::new(id, name, EntityType::Service, description)
                .with_parent("platform-root")
                .with_signal("response_time", format!("{id}_response_time"))
                .with_signal("error_rate", format!("{id}_error_rate"))
                .with_signal("availability", format!("{id}_availability")),
        );
    }

    graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impact::{critical_path, dependency_impact};

    #[test]
    fn test_ecommerce_shape() {
        let graph = ecommerce_model();
        assert_eq!(graph.entity_count(), 9);
        assert_eq!(graph.dependencies().len(), 7);
        assert_eq!(graph.info().owner_team, "Platform Engineering");
        assert_eq!(graph.entities().next().unwrap().id, "ecommerce-root");
    }

    #[test]
    fn test_ecommerce_payment_failure_is_critical() {
        let impact = dependency_impact(&ecommerce_model(), "payment-service");
        assert_eq!(impact.impact_severity, Criticality::Critical);
        assert_eq!(impact.affected_services.len(), 1);
        assert_eq!(impact.affected_services[0].name, "Order Service");
    }

    #[test]
    fn test_ecommerce_critical_path_from_gateway() {
        let path = critical_path(&ecommerce_model(), "api-service");
        assert_eq!(
            path,
            vec![
                "api-service",
                "product-service",
                "product-db",
                "order-service",
                "payment-service",
                "order-db",
                "service-bus",
            ]
        );
    }

    #[test]
    fn test_microservices_shape() {
        let graph = microservices_model();
        assert_eq!(graph.entity_count(), 4);
        assert!(graph.dependencies().is_empty());
        let user = graph.entity("user-service").unwrap();
        assert_eq!(user.parent_id.as_deref(), Some("platform-root"));
        assert_eq!(user.signals["error_rate"], "user-service_error_rate");
    }
}
