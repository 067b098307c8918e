//! The standard report catalog
//!
//! One definition per supported template id. Parameter names match the keys
//! found in task `parameters` documents.

use xlreport_core::Condition;
use xlreport_render::Column;

use crate::builder::{ApprovalReport, DefinedReport, ReportBuilder};
use crate::definition::{ParamSpec, ReportDefinition, Target};

pub const INCIDENT_LOG: &str = "Incident_log";
pub const INCIDENT: &str = "Incident";
pub const CASE_DETAILS: &str = "Case_details";
/// Lower-case collection read by the digital signature report
pub const SIGNATURE_CASE_DETAILS: &str = "case_details";
pub const DISTRIBUTION_TRANSACTIONS: &str = "Case_distribution_drc_transactions";

/// Audit collections
pub const FILE_DOWNLOAD_LOG: &str = "file_download_log";
pub const DOWNLOAD: &str = "download";

pub const ACTIONS: &[&str] = &["collect arrears and CPE", "collect arrears", "collect CPE"];
pub const INCIDENT_STATUSES: &[&str] = &[
    "Incident Open",
    "Reject",
    "Complete",
    "Incident Error",
    "Incident Inprogress",
];
pub const COMMISSION_RULES: &[&str] = &["PEO TV", "BB"];
pub const ARREARS_BANDS: &[&str] = &["AB-5_10", "AB-25_50"];

const COMMISSION_RULE_FIELD: &str = "drc_commision_rule";
const COMMISSION_RULE_LABEL: &str = "DRC Commission Rule:";

/// Every report in the standard catalog, ordered by template id.
pub fn standard_reports() -> Vec<Box<dyn ReportBuilder>> {
    vec![
        defined(incident_detail()),
        defined(open_incident_distribution()),
        defined(pending_reject_incidents()),
        defined(direct_lod_incidents()),
        defined(cpe_incidents()),
        defined(rejected_incidents()),
        defined(case_distribution_details()),
        defined(case_distribution_batch_list()),
        defined(drc_assign_batch_approval()),
        defined(drc_summary()),
        Box::new(ApprovalReport::new(drc_approval(), "approve", "approval_type")),
        defined(request_log_details()),
        defined(case_details()),
        defined(digital_signatures_relevant_lod()),
        defined(each_lod_or_final_reminder()),
    ]
}

fn defined(definition: ReportDefinition) -> Box<dyn ReportBuilder> {
    Box::new(DefinedReport::new(definition))
}

fn commission_rule(name: &'static str) -> ParamSpec {
    ParamSpec::choice(name, COMMISSION_RULE_FIELD, COMMISSION_RULES).label(COMMISSION_RULE_LABEL)
}

// ============================================================================
// Incidents
// ============================================================================

pub fn incident_detail() -> ReportDefinition {
    ReportDefinition::new(20, "incidents_details", "INCIDENT REPORT", INCIDENT_LOG)
        .param(ParamSpec::choice("action_type", "Actions", ACTIONS).label("Action:").audit_as("Action"))
        .param(ParamSpec::choice("status", "Incident_Status", INCIDENT_STATUSES).audit_as("Status"))
        .param(ParamSpec::dates("Created_Dtm"))
        .columns(vec![
            Column::identifier("Incident_Id"),
            Column::new("Account_Num"),
            Column::new("Incident_Status"),
            Column::new("Actions"),
            Column::new("Monitor_Months"),
            Column::new("Created_By"),
            Column::datetime("Created_Dtm"),
            Column::new("Source_Type"),
        ])
        .audit(FILE_DOWNLOAD_LOG)
}

pub fn open_incident_distribution() -> ReportDefinition {
    ReportDefinition::new(
        21,
        "incident_open_distribution",
        "OPEN INCIDENT DISTRIBUTION REPORT",
        INCIDENT_LOG,
    )
    .sheet_name("OPEN INCIDENT DISTRIBUTION")
    .base("Incident_Status", Condition::eq("Incident Open"))
    .columns(vec![
        Column::identifier("_id").header("Id"),
        Column::new("Incident_Status"),
        Column::new("Account_Num"),
        Column::new("Actions"),
        Column::new("Amount"),
        Column::new("Source_Type"),
    ])
    .audit(FILE_DOWNLOAD_LOG)
}

pub fn pending_reject_incidents() -> ReportDefinition {
    ReportDefinition::new(
        22,
        "pending_reject_incidents",
        "PENDING REJECT INCIDENT REPORT",
        INCIDENT,
    )
    .base("Incident_Status", Condition::one_of(["Incident Reject"]))
    .param(
        ParamSpec::list("drc_commission_rules", "Filtered_Reason")
            .label("DRC Commission Rules:")
            .audit_as("DRC_Commision_Rule"),
    )
    .param(ParamSpec::dates("Rejected_Dtm"))
    .columns(vec![
        Column::identifier("Incident_Id"),
        Column::new("Incident_Status"),
        Column::new("Account_Num"),
        Column::new("Filtered_Reason"),
        Column::datetime("Rejected_Dtm"),
        Column::new("Source_Type"),
    ])
    .audit(DOWNLOAD)
}

pub fn direct_lod_incidents() -> ReportDefinition {
    ReportDefinition::new(23, "direct_lod_incidents", "DIRECT LOD INCIDENTS REPORT", INCIDENT)
        .base("Incident_Status", Condition::eq("Direct LOD"))
        .param(ParamSpec::dates("Created_Dtm"))
        .param(commission_rule("drc_commission_rules").audit_as("DRC_Commsion_Rule"))
        .columns(vec![
            Column::identifier("Incident_Id"),
            Column::new("Incident_Status"),
            Column::new("Account_Num"),
            Column::new("Amount"),
            Column::new("Source_Type"),
        ])
        .audit(FILE_DOWNLOAD_LOG)
}

pub fn cpe_incidents() -> ReportDefinition {
    ReportDefinition::new(24, "cpe_incidents", "CPE INCIDENT REPORT", INCIDENT_LOG)
        .base("Actions", Condition::eq("collect CPE"))
        .param(ParamSpec::dates("Created_Dtm"))
        .param(commission_rule("drc_commission_rules").audit_as("DRC_Commsion_Rule"))
        .columns(vec![
            Column::identifier("Incident_Id"),
            Column::new("Incident_Status"),
            Column::new("Account_Num"),
            Column::new("Actions"),
            Column::datetime("Created_Dtm"),
        ])
        .audit(DOWNLOAD)
}

pub fn rejected_incidents() -> ReportDefinition {
    ReportDefinition::new(25, "rejected_incidents", "REJECTED INCIDENT REPORT", INCIDENT)
        .base("Incident_Status", Condition::eq("Incident Reject"))
        .param(ParamSpec::choice("action_type", "Actions", ACTIONS).label("Actions:").audit_as("Actions"))
        .param(commission_rule("drc_commission_rules").audit_as("DRC_Commision_Rule"))
        .param(ParamSpec::dates("Created_Dtm"))
        .columns(rejection_columns())
        .audit(DOWNLOAD)
}

fn rejection_columns() -> Vec<Column> {
    vec![
        Column::identifier("Incident_Id"),
        Column::new("Incident_Status"),
        Column::new("Account_Num"),
        Column::datetime("Created_Dtm"),
        Column::new("Filtered_Reason"),
        Column::datetime("Rejected_Dtm"),
        Column::new("Rejected_By"),
    ]
}

// ============================================================================
// Case distribution
// ============================================================================

pub fn case_distribution_details() -> ReportDefinition {
    ReportDefinition::new(
        26,
        "case_distribution_details",
        "CASE DISTRIBUTION DRC TRANSACTION LIST",
        DISTRIBUTION_TRANSACTIONS,
    )
    .sheet_name("CASE DISTRIBUTION REPORT")
    .param(
        ParamSpec::choice("current_arrears_band", "Arrears Band", ARREARS_BANDS)
            .label("Arrears Band:")
            .audit_as("Arrears_Band"),
    )
    .param(commission_rule("drc_commission_rules").audit_as("DRC_commision_rule"))
    .param(ParamSpec::dates("Created Dtm"))
    .columns(vec![
        Column::identifier("Case Distribution Batch ID"),
        Column::datetime("Created Dtm"),
        Column::new("Distributed Status"),
        Column::new("Action Type"),
        Column::new("DRC Commission Rule"),
        Column::new("Arrears Band"),
        Column::new("Case Count"),
        Column::new("Approval"),
    ])
    .audit(FILE_DOWNLOAD_LOG)
}

pub fn case_distribution_batch_list() -> ReportDefinition {
    ReportDefinition::new(
        27,
        "case_distribution_batch_list",
        "CASE DISTRIBUTION DRC TRANSACTION LIST",
        DISTRIBUTION_TRANSACTIONS,
    )
    .sheet_name("CASE DISTRIBUTION REPORT")
    .param(
        ParamSpec::int_choice("case_distribution_batch_id", "case_distribution_batch_id", &[1, 2])
            .label("Case Distribution Batch ID:")
            .audit_as("Case_distribution_batch_id"),
    )
    .columns(vec![
        Column::new("Batch Sequence"),
        Column::new("rulebase count"),
        Column::datetime("Approved on"),
    ])
    .audit(DOWNLOAD)
}

pub fn drc_assign_batch_approval() -> ReportDefinition {
    ReportDefinition::new(
        30,
        "drc_assign_batch_approval",
        "DRC ASSIGN BATCH APPROVAL REPORT",
        "Template_forwarded_approver",
    )
    .param(ParamSpec::choice("approver_ref", "approver_ref", &["k1", "k2"]).label("Approver Reference:"))
    .columns(vec![
        Column::identifier("Batch_id"),
        Column::datetime("created_dtm"),
        Column::new("drc_commision_rule"),
        Column::new("approval_type"),
        Column::new("case_count"),
        Column::new("total_arrears"),
    ])
}

pub fn drc_summary() -> ReportDefinition {
    ReportDefinition::new(32, "drc_summary", "DRC SUMMARY REPORT", "Case_Distribution_DRC_Summary")
        .param(ParamSpec::choice("drc", "drc", &["D1", "D2"]).label("DRC:"))
        .param(
            ParamSpec::int_choice("case_distribution_batch_id", "case_distribution_batch_id", &[1, 2, 3])
                .label("Case Distribution Batch ID:"),
        )
        .columns(vec![
            Column::datetime("created_dtm"),
            Column::identifier("drc_id"),
            Column::new("drc"),
            Column::new("case_count"),
            Column::new("tot_arrease"),
            Column::datetime("proceed_on"),
        ])
}

/// Rows come from the `approve` array of each case; see [`ApprovalReport`].
pub fn drc_approval() -> ReportDefinition {
    ReportDefinition::new(33, "drc_approval", "DRC APPROVAL REPORT", CASE_DETAILS)
        .param(
            ParamSpec::choice("approval_type", "approval_type", &["a1", "a2"])
                .target(Target::Shape)
                .label("Approval Type:"),
        )
        .param(ParamSpec::dates("created_dtm"))
        .columns(vec![
            Column::identifier("case_id"),
            Column::datetime("created_dtm"),
            Column::new("created_by"),
            Column::new("approval_type"),
            Column::new("approve_status"),
            Column::new("approved_by"),
            Column::new("remark"),
        ])
}

// ============================================================================
// Requests and cases
// ============================================================================

pub fn request_log_details() -> ReportDefinition {
    ReportDefinition::new(37, "request_log_details", "REQUEST LOG REPORT", "Request_log")
        .param(ParamSpec::text("delegate_user_id", "delegate_user_id").label("Delegate User ID:"))
        .param(
            ParamSpec::choice("user_interaction_type", "Request Type", &["FMB", "RO", "Admin"])
                .label("Interaction Type:")
                .audit_as("interaction_type"),
        )
        .param(
            ParamSpec::choice("request_accept", "Approved", &["Approved", "Pending", "Rejected"])
                .label("Request Status:"),
        )
        .param(ParamSpec::dates("Requested date"))
        .columns(vec![
            Column::identifier("Case ID"),
            Column::new("Status"),
            Column::new("Request Status"),
            Column::amount("Amount"),
            Column::span("Validity Period", "Validity Period Start", "Validity Period End"),
            Column::new("DRC"),
            Column::new("Request Type"),
            Column::us_date("Requested date"),
            Column::new("Approved"),
        ])
}

pub fn case_details() -> ReportDefinition {
    const DATE_FIELDS: &[&str] = &["Approved on", "Letter issued on"];
    ReportDefinition::new(38, "cases_details", "CASE REPORT", "Case_log")
        .param(ParamSpec::choice(
            "case_current_status",
            "Status",
            &["Pending FMB", "In progress", "Closed"],
        )
        .label("Status:")
        .audit_as("status"))
        .param(ParamSpec::dates("Approved on").target(Target::AnyField(DATE_FIELDS)))
        .columns(vec![
            Column::identifier("Case ID"),
            Column::new("Status"),
            Column::new("Request status"),
            Column::span("Validity Period", "Validity Period Start", "Validity Period End"),
            Column::new("DRC"),
            Column::new("Request Details"),
            Column::us_date("Letter issued on"),
            Column::us_date("Approved on"),
            Column::new("Approved by"),
            Column::new("Remark"),
        ])
}

pub fn digital_signatures_relevant_lod() -> ReportDefinition {
    ReportDefinition::new(
        39,
        "digital_signatures_relevant_lod",
        "DIGITAL SIGNATURES RELEVANT LOD REPORT",
        SIGNATURE_CASE_DETAILS,
    )
    .sheet_name("DIGITAL SIGNATURES LOD")
    .param(
        ParamSpec::choice(
            "case_current_status",
            "Case_current_starus",
            &["Abandand", "LIT prescribed"],
        )
        .label("Case Current Status:")
        .audit_as("Case_Current_Status"),
    )
    .columns(vec![
        Column::identifier("Incident_Id"),
        Column::new("Incident_Status"),
        Column::new("Account_Num"),
        Column::datetime("Created_Dtm"),
        Column::new("Filtered_Reason"),
    ])
    .audit(FILE_DOWNLOAD_LOG)
}

pub fn each_lod_or_final_reminder() -> ReportDefinition {
    ReportDefinition::new(
        40,
        "each_lod_or_final_reminder",
        "EACH LOD OR FINAL REMINDER REPORT",
        INCIDENT,
    )
    .param(
        ParamSpec::choice("case_current_status", "Actions", ACTIONS)
            .label("Actions:")
            .audit_as("Case_Current_Status"),
    )
    .param(
        ParamSpec::choice("current_document_type", "current_document_type", COMMISSION_RULES)
            .label("Document Type:")
            .audit_as("Current_Document_Type"),
    )
    .columns(rejection_columns())
    .audit(DOWNLOAD)
}
