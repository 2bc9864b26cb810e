use actix_cors::Cors;

pub fn create_cors() -> Cors {
    Cors::default()
        // sites embedding the widget are not known in advance
        .allowed_origin_fn(|_, _req_head| true)
        .allowed_methods(vec!["GET", "POST", "PATCH", "DELETE", "OPTIONS"])
        .allow_any_header()
        .max_age(3600)
}
