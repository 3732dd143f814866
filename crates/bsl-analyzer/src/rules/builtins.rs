//! Names provided by the runtime's global context.

use crate::protocol::async_call::DEFAULT_ASYNC_METHODS;

/// Global methods callable without a receiver.
const GLOBAL_METHODS: &[&str] = &[
    "BeginTransaction",
    "CommitTransaction",
    "RollbackTransaction",
    "TransactionActive",
    "Message",
    "ErrorDescription",
    "ErrorInfo",
    "Format",
    "NStr",
    "StrTemplate",
    "StrLen",
    "StrReplace",
    "StrFind",
    "TrimAll",
    "TrimL",
    "TrimR",
    "Upper",
    "Lower",
    "Left",
    "Right",
    "Mid",
    "IsBlankString",
    "ValueIsFilled",
    "String",
    "Number",
    "Boolean",
    "Date",
    "CurrentDate",
    "CurrentSessionDate",
    "Type",
    "TypeOf",
    "XMLString",
    "XMLValue",
    "Min",
    "Max",
    "Round",
    "Int",
    "Notify",
    "NotifyChanged",
    "AttachIdleHandler",
    "DetachIdleHandler",
    "GetFunctionalOption",
    "PredefinedValue",
    "IsInRole",
    "RolesAvailable",
    "Eval",
];

/// Global properties readable without a receiver.
const GLOBAL_PROPERTIES: &[&str] = &[
    "Metadata",
    "Catalogs",
    "Documents",
    "Enums",
    "Constants",
    "ChartsOfAccounts",
    "InformationRegisters",
    "AccumulationRegisters",
    "DataProcessors",
    "Reports",
    "ExchangePlans",
    "SessionParameters",
    "ThisObject",
    "ThisForm",
    "Items",
    "Parameters",
    "ApplicationParameters",
];

pub fn is_global_method(name: &str) -> bool {
    GLOBAL_METHODS.contains(&name) || DEFAULT_ASYNC_METHODS.contains(&name)
}

pub fn is_global_property(name: &str) -> bool {
    GLOBAL_PROPERTIES.contains(&name)
}
