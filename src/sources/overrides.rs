//! Manually curated Latin -> Chinese name pairs: recent rookies the official
//! directory lags on, plus spellings the sources disagree about. Merged into
//! the name map last, so an entry here only fills keys the official source
//! did not provide.

use crate::merge::NameMap;

pub const MANUAL_NAMES: &[(&str, &str)] = &[
    ("adam flagler", "亚当-弗拉格勒"),
    ("chris paul", "克里斯-保罗"),
    ("ben simmons", "本-西蒙斯"),
    // 2024 draft class
    ("zaccharie risacher", "扎卡里-里萨谢"),
    ("alex sarr", "亚历克斯-萨尔"),
    ("reed sheppard", "里德-谢帕德"),
    ("stephon castle", "斯蒂芬-卡斯尔"),
    ("ron holland ii", "龙-霍兰"),
    ("tidjane salaun", "蒂贾尼-萨隆"),
    ("donovan clingan", "多诺万-克林根"),
    ("rob dillingham", "罗伯-迪林厄姆"),
    ("zach edey", "扎克-伊迪"),
    ("cody williams", "科迪-威廉姆斯"),
    ("matas buzelis", "马塔斯-布泽利斯"),
    ("nikola topic", "尼古拉-托皮奇"),
    ("devin carter", "德文-卡特"),
    ("bub carrington", "巴布-卡林顿"),
    ("kel'el ware", "凯尔-韦尔"),
    ("jared mccain", "贾里德-麦凯恩"),
    ("dalton knecht", "道尔顿-克内克特"),
    ("tristan da silva", "特里斯坦-达-席尔瓦"),
    ("ja'kobe walter", "贾科比-沃尔特"),
    ("jaylon tyson", "杰伦-泰森"),
    ("yves missi", "伊夫-米西"),
    ("kyshawn george", "凯肖恩-乔治"),
    ("terrence shannon jr.", "特伦斯-香农"),
    ("ryan dunn", "瑞安-邓恩"),
    ("isaiah collier", "以赛亚-科利尔"),
    ("aj johnson", "AJ-约翰逊"),
    ("bronny james", "布朗尼-詹姆斯"),
    ("adem bona", "阿德姆-博纳"),
    ("jamal shead", "贾马尔-希德"),
    ("kj simpson", "KJ-辛普森"),
    ("kyle filipowski", "凯尔-菲利波夫斯基"),
    // Spellings the sources disagree about
    ("brandon boston", "布兰登-波士顿"),
    ("cui cui", "崔永熙"),
    ("guerschon yabusele", "盖尔雄-亚布塞莱"),
    ("d'angelo russell", "丹吉洛-拉塞尔"),
    ("elfrid payton", "埃尔弗里德-佩顿"),
    ("kj martin", "肯扬-马丁二世"),
    ("kenny lofton jr.", "肯尼-洛夫顿"),
    ("kenneth lofton jr.", "肯尼-洛夫顿"),
    ("gg jackson", "GG-杰克逊"),
    ("gg jackson ii", "GG-杰克逊"),
    ("g.g. jackson", "GG-杰克逊"),
    ("vince williams jr.", "文斯-威廉姆斯"),
    ("scotty pippen jr.", "斯科蒂-皮蓬二世"),
    ("trayce jackson-davis", "特雷斯-杰克逊-戴维斯"),
    ("brandin podziemski", "布兰丁-波杰姆斯基"),
    ("ausar thompson", "奥萨尔-汤普森"),
    ("amen thompson", "阿门-汤普森"),
    ("dereck lively ii", "德雷克-莱夫利二世"),
    ("olivier-maxence prosper", "奥利维耶-马克桑斯-普罗斯珀"),
];

/// Applies the override table; existing keys are left untouched.
pub fn apply_overrides(names: &mut NameMap) {
    for (latin, chinese) in MANUAL_NAMES {
        names.add(latin, chinese);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_never_replace_official_entries() {
        let mut names = NameMap::new();
        names.add("Chris Paul", "官方写法");
        apply_overrides(&mut names);
        assert_eq!(names.get("chris paul").unwrap().display, "官方写法");
        // but gaps are filled
        assert_eq!(names.get("Bronny James").unwrap().display, "布朗尼-詹姆斯");
    }

    #[test]
    fn alternate_spellings_share_a_display_name() {
        let mut names = NameMap::new();
        apply_overrides(&mut names);
        assert_eq!(names.get("GG Jackson").unwrap().display, "GG-杰克逊");
        assert_eq!(names.get("G.G. Jackson").unwrap().display, "GG-杰克逊");
    }
}
