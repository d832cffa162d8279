//! Initial database migration.
//!
//! Creates enums, tenant-scoped tables and the `updated_at` trigger. Foreign
//! keys here are single-column; the tenant constraints migration replaces the
//! cross-table ones with composite `(id, tenant_id)` keys.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: TENANTS & STAFF
        // ============================================================
        db.execute_unprepared(TENANTS_SQL).await?;
        db.execute_unprepared(USERS_SQL).await?;

        // ============================================================
        // PART 3: CLIENTS & ROSTER
        // ============================================================
        db.execute_unprepared(CLIENTS_SQL).await?;
        db.execute_unprepared(SHIFTS_SQL).await?;

        // ============================================================
        // PART 4: CLIENT RECORDS
        // ============================================================
        db.execute_unprepared(CASE_NOTES_SQL).await?;
        db.execute_unprepared(CARE_PLANS_SQL).await?;
        db.execute_unprepared(MEDICATION_RECORDS_SQL).await?;

        // ============================================================
        // PART 5: BILLING
        // ============================================================
        db.execute_unprepared(RATE_CARD_SQL).await?;
        db.execute_unprepared(PUBLIC_HOLIDAYS_SQL).await?;
        db.execute_unprepared(INVOICES_SQL).await?;

        // ============================================================
        // PART 6: TRIGGERS
        // ============================================================
        db.execute_unprepared(TRIGGERS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
CREATE TYPE user_role AS ENUM ('admin', 'coordinator', 'support_worker');

CREATE TYPE shift_status AS ENUM (
    'unassigned',
    'requested',
    'assigned',
    'in_progress',
    'completed',
    'cancelled'
);

CREATE TYPE case_note_category AS ENUM (
    'general',
    'progress',
    'incident',
    'medication',
    'behaviour'
);

CREATE TYPE care_plan_status AS ENUM ('draft', 'active', 'archived');

CREATE TYPE invoice_status AS ENUM ('draft', 'issued', 'paid', 'void');

CREATE TYPE rate_band AS ENUM (
    'weekday_daytime',
    'weekday_evening',
    'weekday_night',
    'saturday',
    'sunday',
    'public_holiday'
);
";

const TENANTS_SQL: &str = r"
CREATE TABLE tenants (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(255) NOT NULL,
    slug VARCHAR(100) NOT NULL UNIQUE,
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_tenant_slug CHECK (slug ~ '^[a-z0-9][a-z0-9-]*$')
);
";

const USERS_SQL: &str = r"
CREATE TABLE users (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    tenant_id UUID NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
    email VARCHAR(255) NOT NULL,
    password_hash VARCHAR(255) NOT NULL,
    full_name VARCHAR(255) NOT NULL,
    role user_role NOT NULL DEFAULT 'support_worker',
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_users_tenant_email UNIQUE (tenant_id, email)
);

CREATE INDEX idx_users_tenant ON users(tenant_id) WHERE is_active = true;
";

const CLIENTS_SQL: &str = r"
CREATE TABLE clients (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    tenant_id UUID NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
    first_name VARCHAR(100) NOT NULL,
    last_name VARCHAR(100) NOT NULL,
    ndis_number VARCHAR(20),
    date_of_birth DATE,
    phone VARCHAR(50),
    address TEXT,
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_clients_tenant_name ON clients(tenant_id, last_name, first_name);
CREATE UNIQUE INDEX uq_clients_tenant_ndis ON clients(tenant_id, ndis_number)
    WHERE ndis_number IS NOT NULL;
";

const SHIFTS_SQL: &str = r"
CREATE TABLE shifts (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    tenant_id UUID NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
    assigned_user_id UUID REFERENCES users(id) ON DELETE SET NULL,
    client_id UUID REFERENCES clients(id) ON DELETE CASCADE,
    title VARCHAR(255) NOT NULL,
    start_time TIMESTAMP NOT NULL,
    end_time TIMESTAMP NOT NULL,
    status shift_status NOT NULL DEFAULT 'unassigned',
    series_id UUID,
    invoice_id UUID,
    notes TEXT,
    created_by UUID REFERENCES users(id) ON DELETE SET NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_shift_time_range CHECK (end_time > start_time)
);

CREATE INDEX idx_shifts_tenant_start ON shifts(tenant_id, start_time);
CREATE INDEX idx_shifts_assignee ON shifts(assigned_user_id, start_time)
    WHERE status <> 'cancelled';
CREATE INDEX idx_shifts_series ON shifts(series_id) WHERE series_id IS NOT NULL;
CREATE INDEX idx_shifts_unbilled ON shifts(client_id, start_time)
    WHERE status = 'completed' AND invoice_id IS NULL;
";

const CASE_NOTES_SQL: &str = r"
CREATE TABLE case_notes (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    tenant_id UUID NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
    client_id UUID NOT NULL REFERENCES clients(id) ON DELETE CASCADE,
    author_id UUID REFERENCES users(id) ON DELETE SET NULL,
    shift_id UUID REFERENCES shifts(id) ON DELETE SET NULL,
    title VARCHAR(255) NOT NULL,
    body TEXT NOT NULL,
    category case_note_category NOT NULL DEFAULT 'general',
    tags JSONB NOT NULL DEFAULT '[]',
    archived_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_case_notes_client ON case_notes(tenant_id, client_id, created_at DESC);
CREATE INDEX idx_case_notes_tags ON case_notes USING GIN (tags);
";

const CARE_PLANS_SQL: &str = r"
CREATE TABLE care_plans (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    tenant_id UUID NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
    client_id UUID NOT NULL REFERENCES clients(id) ON DELETE CASCADE,
    author_id UUID REFERENCES users(id) ON DELETE SET NULL,
    title VARCHAR(255) NOT NULL,
    summary TEXT,
    goals JSONB NOT NULL DEFAULT '[]',
    status care_plan_status NOT NULL DEFAULT 'draft',
    start_date DATE NOT NULL,
    review_date DATE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_care_plan_review CHECK (review_date IS NULL OR review_date >= start_date)
);

CREATE INDEX idx_care_plans_client ON care_plans(tenant_id, client_id, start_date DESC);
";

const MEDICATION_RECORDS_SQL: &str = r"
CREATE TABLE medication_records (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    tenant_id UUID NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
    client_id UUID NOT NULL REFERENCES clients(id) ON DELETE CASCADE,
    recorded_by UUID REFERENCES users(id) ON DELETE SET NULL,
    medication_name VARCHAR(255) NOT NULL,
    dosage VARCHAR(100) NOT NULL,
    route VARCHAR(50),
    administered_at TIMESTAMP NOT NULL,
    notes TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_medication_records_client
    ON medication_records(tenant_id, client_id, administered_at DESC);
";

const RATE_CARD_SQL: &str = r"
CREATE TABLE rate_card_items (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    tenant_id UUID NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
    rate_band rate_band NOT NULL,
    support_item_number VARCHAR(50) NOT NULL,
    description VARCHAR(255) NOT NULL,
    hourly_rate NUMERIC(12, 2) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_rate_card_tenant_band UNIQUE (tenant_id, rate_band),
    CONSTRAINT chk_rate_positive CHECK (hourly_rate > 0)
);
";

const PUBLIC_HOLIDAYS_SQL: &str = r"
CREATE TABLE public_holidays (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    tenant_id UUID NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
    holiday_date DATE NOT NULL,
    name VARCHAR(255) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_public_holidays_tenant_date UNIQUE (tenant_id, holiday_date)
);
";

const INVOICES_SQL: &str = r"
CREATE TABLE invoices (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    tenant_id UUID NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
    client_id UUID NOT NULL REFERENCES clients(id) ON DELETE CASCADE,
    invoice_number VARCHAR(50) NOT NULL,
    period_start DATE NOT NULL,
    period_end DATE NOT NULL,
    status invoice_status NOT NULL DEFAULT 'draft',
    subtotal NUMERIC(12, 2) NOT NULL DEFAULT 0,
    created_by UUID REFERENCES users(id) ON DELETE SET NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_invoices_tenant_number UNIQUE (tenant_id, invoice_number),
    CONSTRAINT chk_invoice_period CHECK (period_end >= period_start)
);

CREATE INDEX idx_invoices_client ON invoices(tenant_id, client_id, created_at DESC);

CREATE TABLE invoice_line_items (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    tenant_id UUID NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
    invoice_id UUID NOT NULL REFERENCES invoices(id) ON DELETE CASCADE,
    shift_id UUID NOT NULL REFERENCES shifts(id) ON DELETE CASCADE,
    support_item_number VARCHAR(50) NOT NULL,
    description VARCHAR(255) NOT NULL,
    service_date DATE NOT NULL,
    rate_band rate_band NOT NULL,
    hours NUMERIC(8, 2) NOT NULL,
    unit_price NUMERIC(12, 2) NOT NULL,
    line_total NUMERIC(12, 2) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_line_hours_positive CHECK (hours > 0)
);

CREATE INDEX idx_invoice_line_items_invoice ON invoice_line_items(invoice_id, service_date);

ALTER TABLE shifts
    ADD CONSTRAINT shifts_invoice_id_fkey
    FOREIGN KEY (invoice_id) REFERENCES invoices(id) ON DELETE SET NULL;
";

const TRIGGERS_SQL: &str = r"
-- ============================================================
-- FUNCTION: set_updated_at
-- Stamps updated_at on every UPDATE
-- ============================================================
CREATE OR REPLACE FUNCTION set_updated_at()
RETURNS TRIGGER AS $$
BEGIN
    NEW.updated_at = now();
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_tenants_updated_at BEFORE UPDATE ON tenants
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
CREATE TRIGGER trg_users_updated_at BEFORE UPDATE ON users
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
CREATE TRIGGER trg_clients_updated_at BEFORE UPDATE ON clients
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
CREATE TRIGGER trg_shifts_updated_at BEFORE UPDATE ON shifts
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
CREATE TRIGGER trg_case_notes_updated_at BEFORE UPDATE ON case_notes
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
CREATE TRIGGER trg_care_plans_updated_at BEFORE UPDATE ON care_plans
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
CREATE TRIGGER trg_medication_records_updated_at BEFORE UPDATE ON medication_records
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
CREATE TRIGGER trg_rate_card_items_updated_at BEFORE UPDATE ON rate_card_items
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
CREATE TRIGGER trg_invoices_updated_at BEFORE UPDATE ON invoices
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
";

const DROP_ALL_SQL: &str = r"
-- Order matters due to foreign key constraints
DROP TABLE IF EXISTS invoice_line_items CASCADE;
DROP TABLE IF EXISTS invoices CASCADE;
DROP TABLE IF EXISTS public_holidays CASCADE;
DROP TABLE IF EXISTS rate_card_items CASCADE;
DROP TABLE IF EXISTS medication_records CASCADE;
DROP TABLE IF EXISTS care_plans CASCADE;
DROP TABLE IF EXISTS case_notes CASCADE;
DROP TABLE IF EXISTS shifts CASCADE;
DROP TABLE IF EXISTS clients CASCADE;
DROP TABLE IF EXISTS users CASCADE;
DROP TABLE IF EXISTS tenants CASCADE;

DROP FUNCTION IF EXISTS set_updated_at();

DROP TYPE IF EXISTS rate_band;
DROP TYPE IF EXISTS invoice_status;
DROP TYPE IF EXISTS care_plan_status;
DROP TYPE IF EXISTS case_note_category;
DROP TYPE IF EXISTS shift_status;
DROP TYPE IF EXISTS user_role;
";
