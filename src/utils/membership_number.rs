use chrono::NaiveDate;
use rand::Rng;

const CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// 生成会员号：GYM-YYYYMMDD-XXXXXX
///
/// 唯一性由 members.membership_number 的唯一索引兜底
pub fn generate_membership_number(join_date: NaiveDate) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..6)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect();
    format!("GYM-{}-{suffix}", join_date.format("%Y%m%d"))
}
