//! Root control page.
//!
//! Static layout plus one control per registered button and slider. The
//! embedded script polls the joystick every 100 ms and sends `/drive`;
//! it keeps sending while the stick is held so the failsafe stays fed.

use core::fmt::Write as _;

use super::registry::{ButtonRegistry, SliderRegistry};

const HEAD: &str = "<!doctype html><html><head><meta charset='utf-8'/>\
<meta name='viewport' content='width=device-width,initial-scale=1'/>\
<title>Robot Controller</title><style>\
body{font-family:sans-serif;background:#111;color:#eee;margin:0}\
#wrap{max-width:420px;margin:auto;padding:12px}\
.row{margin:12px 0}\
#joy{width:240px;height:240px;border-radius:50%;background:#333;position:relative;margin:auto;touch-action:none}\
#stick{width:80px;height:80px;border-radius:50%;background:#0a8;position:absolute;left:80px;top:80px}\
button{padding:10px 14px;margin:4px;font-size:16px}\
input[type=range]{width:100%}\
</style></head><body><div id='wrap'><h2>Robot Controller</h2>";

const SCRIPT: &str = "<script>\
const joy=document.getElementById('joy'),stick=document.getElementById('stick');\
const thr=document.getElementById('thr'),tval=document.getElementById('tval');\
const st=document.getElementById('status');\
let x=0,y=0,held=false,last='';\
function place(){stick.style.left=(80+x*0.8)+'px';stick.style.top=(80-y*0.8)+'px';}\
function move(e){const r=joy.getBoundingClientRect();\
let dx=(e.clientX-r.left-120)/1.2,dy=(r.top+120-e.clientY)/1.2;\
x=Math.max(-100,Math.min(100,Math.round(dx)));y=Math.max(-100,Math.min(100,Math.round(dy)));\
if(Math.abs(x)<4)x=0;if(Math.abs(y)<4)y=0;place();}\
joy.addEventListener('pointerdown',e=>{held=true;joy.setPointerCapture(e.pointerId);move(e);});\
joy.addEventListener('pointermove',e=>{if(held)move(e);});\
joy.addEventListener('pointerup',()=>{held=false;x=0;y=0;place();});\
thr.addEventListener('input',()=>{tval.textContent=thr.value;});\
function send(){const q='x='+x+'&y='+y+'&t='+thr.value;\
if(held||q!==last){last=q;fetch('/drive?'+q).then(r=>r.text()).then(t=>st.textContent=t)\
.catch(()=>st.textContent='offline');}}\
setInterval(send,100);\
document.querySelectorAll('.uBtn').forEach(b=>b.addEventListener('click',\
()=>fetch('/btn?id='+b.dataset.id)));\
document.querySelectorAll('.uSld').forEach(s=>s.addEventListener('input',()=>{\
document.getElementById('sv'+s.dataset.id).textContent=s.value;\
fetch('/sld?id='+s.dataset.id+'&v='+s.value);}));\
</script>";

/// Escape text for an HTML body or single-quoted attribute.
fn escape(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\'' => out.push_str("&#39;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}

/// Render the page for the current registries.
pub fn render(buttons: &ButtonRegistry, sliders: &SliderRegistry) -> String {
    let mut page = String::with_capacity(4096);
    page.push_str(HEAD);

    page.push_str("<div class='row' id='buttons'>");
    if buttons.is_empty() {
        page.push_str("<div style='opacity:.7'>No buttons registered</div>");
    }
    for (id, b) in buttons.iter().enumerate() {
        let _ = write!(page, "<button class='uBtn' data-id='{id}'>");
        escape(&mut page, b.label());
        page.push_str("</button>");
    }
    page.push_str("</div>");

    page.push_str("<div class='row' id='sliders'>");
    for (id, s) in sliders.iter().enumerate() {
        page.push_str("<label>");
        escape(&mut page, s.label());
        let _ = write!(
            page,
            ": <span id='sv{id}'>{value}</span></label>\
             <input class='uSld' data-id='{id}' type='range' min='{min}' max='{max}' \
             step='{step}' value='{value}'/>",
            value = s.value(),
            min = s.min(),
            max = s.max(),
            step = s.step(),
        );
    }
    page.push_str("</div>");

    page.push_str(
        "<div class='row'><div id='joy'><div id='stick'></div></div></div>\
         <div class='row'><label>Throttle: <span id='tval'>100</span>%</label>\
         <input id='thr' type='range' min='0' max='100' value='100'/></div>\
         <div class='row'><div id='status'>ready</div></div>",
    );
    page.push_str(SCRIPT);
    page.push_str("</div></body></html>");
    page
}
