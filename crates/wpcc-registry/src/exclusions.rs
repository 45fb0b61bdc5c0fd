//! Built-in host routes never offered to the connector

pub const EXCLUDED_ROUTES: &[&str] = &[
    "/oembed/1.0",
    "/wp/v2",
    "/wp/v2/taxonomies",
    "/wp/v2/menu-items",
    "/wp/v2/media",
    "/wp/v2/blocks",
    "/wp/v2/templates",
    "/wp/v2/template-parts",
    "/wp/v2/types",
    "/wp/v2/statuses",
    "/wp/v2/block-types",
    "/wp/v2/settings",
    "/wp/v2/themes",
    "/wp/v2/plugins",
    "/wp/v2/sidebars",
    "/wp/v2/widget-types",
    "/wp/v2/widgets",
    "/wp/v2/pattern-directory",
    "/wp/v2/pattern-directory/patterns",
    "/wp/v2/block-patterns/patterns",
    "/wp/v2/block-patterns/categories",
    "/wp-block-editor/v1",
    "/wp-block-editor/v1/url-details",
    "/wp-block-editor/v1/navigation-fallback",
    "/wp-block-editor/v1/export",
    "/wp-site-health/v1",
    "/wp-site-health/v1/tests/background-updates",
    "/wp-site-health/v1/tests/loopback-requests",
    "/wp-site-health/v1/tests/https-status",
    "/wp-site-health/v1/tests/dotorg-communication",
    "/wp-site-health/v1/tests/authorization-header",
    "/wp-site-health/v1/directory-sizes",
    "/wp-site-health/v1/tests/page-cache",
];

pub fn is_excluded(route: &str) -> bool {
    EXCLUDED_ROUTES.contains(&route)
}
