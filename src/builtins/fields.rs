//! Runtime field tables: transaction, global and asset fields.

use crate::types::Ty;

const I: Ty = Ty::Integer;
const B: Ty = Ty::Bytes;

#[derive(Debug, PartialEq, Eq)]
pub struct FieldInfo {
    pub name: &'static str,
    pub ty: Ty,
    /// Array fields take an index: `txn.Accounts[1]`.
    pub array: bool,
    pub min_version: u8,
    /// May be set on an inner transaction with `itxn_field`.
    pub settable: bool,
}

const fn field(name: &'static str, ty: Ty, min_version: u8) -> FieldInfo {
    FieldInfo {
        name,
        ty,
        array: false,
        min_version,
        settable: false,
    }
}

const fn array(name: &'static str, ty: Ty, min_version: u8) -> FieldInfo {
    FieldInfo {
        name,
        ty,
        array: true,
        min_version,
        settable: false,
    }
}

const fn settable(name: &'static str, ty: Ty, min_version: u8) -> FieldInfo {
    FieldInfo {
        name,
        ty,
        array: false,
        min_version,
        settable: true,
    }
}

pub const TXN_FIELDS: &[FieldInfo] = &[
    settable("Sender", B, 1),
    settable("Fee", I, 1),
    field("FirstValid", I, 1),
    field("LastValid", I, 1),
    field("Note", B, 1),
    field("Lease", B, 1),
    settable("Receiver", B, 1),
    settable("Amount", I, 1),
    settable("CloseRemainderTo", B, 1),
    field("VotePK", B, 1),
    field("SelectionPK", B, 1),
    field("VoteFirst", I, 1),
    field("VoteLast", I, 1),
    field("VoteKeyDilution", I, 1),
    settable("Type", B, 1),
    settable("TypeEnum", I, 1),
    settable("XferAsset", I, 1),
    settable("AssetAmount", I, 1),
    settable("AssetSender", B, 1),
    settable("AssetReceiver", B, 1),
    settable("AssetCloseTo", B, 1),
    field("GroupIndex", I, 1),
    field("TxID", B, 1),
    field("ApplicationID", I, 2),
    field("OnCompletion", I, 2),
    array("ApplicationArgs", B, 2),
    field("NumAppArgs", I, 2),
    array("Accounts", B, 2),
    field("NumAccounts", I, 2),
    field("ApprovalProgram", B, 2),
    field("ClearStateProgram", B, 2),
    field("RekeyTo", B, 2),
    settable("ConfigAsset", I, 2),
    settable("ConfigAssetTotal", I, 2),
    settable("ConfigAssetDecimals", I, 2),
    settable("ConfigAssetDefaultFrozen", I, 2),
    settable("ConfigAssetUnitName", B, 2),
    settable("ConfigAssetName", B, 2),
    settable("ConfigAssetURL", B, 2),
    settable("ConfigAssetMetadataHash", B, 2),
    settable("ConfigAssetManager", B, 2),
    settable("ConfigAssetReserve", B, 2),
    settable("ConfigAssetFreeze", B, 2),
    settable("ConfigAssetClawback", B, 2),
    settable("FreezeAsset", I, 2),
    settable("FreezeAssetAccount", B, 2),
    settable("FreezeAssetFrozen", I, 2),
    array("Assets", I, 3),
    field("NumAssets", I, 3),
    array("Applications", I, 3),
    field("NumApplications", I, 3),
    field("GlobalNumUint", I, 3),
    field("GlobalNumByteSlice", I, 3),
    field("LocalNumUint", I, 3),
    field("LocalNumByteSlice", I, 3),
    field("ExtraProgramPages", I, 4),
    field("Nonparticipation", I, 5),
    array("Logs", B, 5),
    field("NumLogs", I, 5),
    field("CreatedAssetID", I, 5),
    field("CreatedApplicationID", I, 5),
];

pub const GLOBAL_FIELDS: &[FieldInfo] = &[
    field("MinTxnFee", I, 1),
    field("MinBalance", I, 1),
    field("MaxTxnLife", I, 1),
    field("ZeroAddress", B, 1),
    field("GroupSize", I, 1),
    field("LogicSigVersion", I, 2),
    field("Round", I, 2),
    field("LatestTimestamp", I, 2),
    field("CurrentApplicationID", I, 2),
    field("CreatorAddress", B, 3),
    field("CurrentApplicationAddress", B, 5),
    field("GroupID", B, 5),
];

pub const ASSET_HOLDING_FIELDS: &[FieldInfo] = &[
    field("AssetBalance", I, 2),
    field("AssetFrozen", I, 2),
];

pub const ASSET_PARAMS_FIELDS: &[FieldInfo] = &[
    field("AssetTotal", I, 2),
    field("AssetDecimals", I, 2),
    field("AssetDefaultFrozen", I, 2),
    field("AssetUnitName", B, 2),
    field("AssetName", B, 2),
    field("AssetURL", B, 2),
    field("AssetMetadataHash", B, 2),
    field("AssetManager", B, 2),
    field("AssetReserve", B, 2),
    field("AssetFreeze", B, 2),
    field("AssetClawback", B, 2),
    field("AssetCreator", B, 5),
];

pub fn find(table: &'static [FieldInfo], name: &str) -> Option<&'static FieldInfo> {
    table.iter().find(|f| f.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        let f = find(TXN_FIELDS, "Accounts").unwrap();
        assert!(f.array);
        assert_eq!(f.ty, Ty::Bytes);
        assert!(find(TXN_FIELDS, "Nope").is_none());
        assert_eq!(find(GLOBAL_FIELDS, "GroupID").unwrap().min_version, 5);
    }

    #[test]
    fn test_settable_fields_are_scalar() {
        assert!(TXN_FIELDS.iter().filter(|f| f.settable).all(|f| !f.array));
        assert!(find(TXN_FIELDS, "Amount").unwrap().settable);
        assert!(!find(TXN_FIELDS, "TxID").unwrap().settable);
    }

    #[test]
    fn test_names_unique() {
        for table in [TXN_FIELDS, GLOBAL_FIELDS, ASSET_HOLDING_FIELDS, ASSET_PARAMS_FIELDS] {
            for (i, f) in table.iter().enumerate() {
                assert!(table[i + 1..].iter().all(|g| g.name != f.name), "{}", f.name);
            }
        }
    }
}
