//! Diesel schema for fleet persistence.

diesel::table! {
    /// Managed server records.
    servers (id) {
        /// Internal server identifier.
        id -> Uuid,
        /// Unique human-readable server name.
        #[max_length = 100]
        name -> Varchar,
        /// Host name or IP address used to reach the server.
        #[max_length = 255]
        address -> Varchar,
        /// OpenSSH-encoded public key.
        public_key -> Text,
        /// PEM-encoded private key.
        private_key -> Text,
        /// Last reported runtime version.
        runtime_version -> Nullable<Text>,
        /// Last reported agent status in its persisted text form.
        raw_status -> Nullable<Text>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Installable service catalogue.
    services (id) {
        /// Internal service identifier.
        id -> Uuid,
        /// Unique service slug.
        #[max_length = 100]
        name -> Varchar,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Per-server service installation records.
    service_bindings (server_id, service_id) {
        /// Owning server.
        server_id -> Uuid,
        /// Bound service.
        service_id -> Uuid,
        /// Installation status (`new`, `installing`, `installed`, `failed`).
        #[max_length = 50]
        status -> Varchar,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// SSH public keys granted access to a server.
    deploy_keys (id) {
        /// Internal deploy key identifier.
        id -> Uuid,
        /// Owning server.
        server_id -> Uuid,
        /// Optional display title.
        title -> Nullable<Text>,
        /// Single-line public key material.
        key_material -> Text,
        /// Hex SHA-256 of the key material.
        #[max_length = 64]
        fingerprint -> Varchar,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Applications hosted on a server.
    apps (id) {
        /// Internal app identifier.
        id -> Uuid,
        /// Owning server.
        server_id -> Uuid,
        /// App slug, unique per server.
        #[max_length = 100]
        name -> Varchar,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::joinable!(service_bindings -> servers (server_id));
diesel::joinable!(service_bindings -> services (service_id));
diesel::joinable!(deploy_keys -> servers (server_id));
diesel::joinable!(apps -> servers (server_id));

diesel::allow_tables_to_appear_in_same_query!(servers, services, service_bindings, deploy_keys, apps);
