//! [`Transport`] over the entry points of a loaded MQ library.

use std::ffi::{c_char, c_void, CString};
use std::ptr;

use tracing::trace;

use super::ffi::*;
use super::loader::{BindingTable, MqLibrary};
use super::{Hconn, Hobj, Transport};
use crate::admin::{BagValue, Command, ResponseItem, Selector};
use crate::config::ConnectOptions;
use crate::constants::*;
use crate::error::Status;
use crate::structures::{get_fixed, MqPmo, Mqgmo, Mqmd, Mqod};

/// Calls MQI functions through a [`MqLibrary`].
#[derive(Debug)]
pub struct NativeTransport {
    library: MqLibrary,
    trace_level: u8,
}

fn check(comp_code: MQLONG, reason_code: MQLONG) -> Result<(), Status> {
    if comp_code == MQCC_OK {
        Ok(())
    } else {
        Err(Status::new(comp_code, reason_code))
    }
}

fn c_string(value: &str, reason_code: i32) -> Result<CString, Status> {
    CString::new(value).map_err(|_| Status::failed(reason_code))
}

impl NativeTransport {
    pub fn new(library: MqLibrary, trace_level: u8) -> Self {
        Self {
            library,
            trace_level,
        }
    }

    fn api(&self) -> Result<BindingTable, Status> {
        self.library
            .bindings()
            .copied()
            .ok_or(Status::failed(MQRC_ENVIRONMENT_ERROR))
    }

    fn trace_call(&self, call: &str, comp_code: MQLONG, reason_code: MQLONG) {
        if self.trace_level >= 3 {
            trace!(call, comp_code, reason_code, "MQI call returned");
        }
    }
}

/// An admin bag. Bags created here are deleted when dropped; nested bags
/// belong to their parent.
struct Bag {
    api: BindingTable,
    handle: MQHBAG,
    owned: bool,
}

impl Bag {
    fn create(api: BindingTable, options: MQLONG) -> Result<Self, Status> {
        let (mut handle, mut cc, mut rc) = (MQHB_UNUSABLE_HBAG, 0, 0);
        // SAFETY: out-parameters point at live locals.
        unsafe { (api.create_bag)(options, &mut handle, &mut cc, &mut rc) };
        check(cc, rc)?;
        Ok(Self {
            api,
            handle,
            owned: true,
        })
    }

    fn count(&self, selector: MQLONG) -> Result<MQLONG, Status> {
        let (mut count, mut cc, mut rc) = (0, 0, 0);
        // SAFETY: as above.
        unsafe { (self.api.count_items)(self.handle, selector, &mut count, &mut cc, &mut rc) };
        check(cc, rc)?;
        Ok(count)
    }

    fn integer(&self, selector: MQLONG, index: MQLONG) -> Result<MQLONG, Status> {
        let (mut value, mut cc, mut rc) = (0, 0, 0);
        // SAFETY: as above.
        unsafe {
            (self.api.inquire_integer)(self.handle, selector, index, &mut value, &mut cc, &mut rc)
        };
        check(cc, rc)?;
        Ok(value)
    }

    fn string(&self, selector: MQLONG, index: MQLONG) -> Result<String, Status> {
        let mut buffer = vec![0u8; 4096];
        let (mut length, mut ccsid, mut cc, mut rc) = (0, 0, 0, 0);
        // SAFETY: `buffer` outlives the call and its length is passed.
        unsafe {
            (self.api.inquire_string)(
                self.handle,
                selector,
                index,
                buffer.len() as MQLONG,
                buffer.as_mut_ptr().cast::<c_char>(),
                &mut length,
                &mut ccsid,
                &mut cc,
                &mut rc,
            )
        };
        if cc == MQCC_FAILED {
            return Err(Status::new(cc, rc));
        }
        let length = (length.max(0) as usize).min(buffer.len());
        Ok(get_fixed(&buffer[..length]))
    }

    /// Decode one nested response bag, dropping system selectors.
    fn items(&self) -> Result<ResponseItem, Status> {
        let mut item = ResponseItem::new();
        for index in 0..self.count(MQSEL_ALL_SELECTORS)? {
            let (mut selector, mut item_type, mut cc, mut rc) = (0, 0, 0, 0);
            // SAFETY: out-parameters point at live locals.
            unsafe {
                (self.api.inquire_item_info)(
                    self.handle,
                    MQSEL_ANY_SELECTOR,
                    index,
                    &mut selector,
                    &mut item_type,
                    &mut cc,
                    &mut rc,
                )
            };
            check(cc, rc)?;
            let selector = Selector(selector);
            if selector.is_system() {
                continue;
            }
            let value = match item_type {
                MQITEM_INTEGER => BagValue::Integer(self.integer(MQSEL_ANY_SELECTOR, index)?),
                MQITEM_STRING => BagValue::String(self.string(MQSEL_ANY_SELECTOR, index)?),
                _ => continue,
            };
            item.insert(selector, value);
        }
        Ok(item)
    }

    fn nested(&self, index: MQLONG) -> Result<Bag, Status> {
        let (mut handle, mut cc, mut rc) = (MQHB_UNUSABLE_HBAG, 0, 0);
        // SAFETY: out-parameters point at live locals.
        unsafe {
            (self.api.inquire_bag)(self.handle, MQHA_BAG_HANDLE, index, &mut handle, &mut cc, &mut rc)
        };
        check(cc, rc)?;
        Ok(Bag {
            api: self.api,
            handle,
            owned: false,
        })
    }
}

impl Drop for Bag {
    fn drop(&mut self) {
        if !self.owned {
            return;
        }
        let (mut cc, mut rc) = (0, 0);
        // SAFETY: `handle` was produced by mqCreateBag.
        unsafe { (self.api.delete_bag)(&mut self.handle, &mut cc, &mut rc) };
    }
}

impl Transport for NativeTransport {
    fn connect(&mut self, q_mgr_name: &str, options: &ConnectOptions) -> Result<Hconn, Status> {
        let api = self.api()?;
        let name = c_string(q_mgr_name, MQRC_Q_MGR_NAME_ERROR)?;
        let mut block = ConnectBlock::new(options);
        let (mut hconn, mut cc, mut rc) = (MQHC_UNUSABLE_HCONN, 0, 0);
        // SAFETY: `name` and `block` outlive the call.
        unsafe {
            (api.connx)(
                name.as_ptr().cast_mut(),
                block.cno_ptr(),
                &mut hconn,
                &mut cc,
                &mut rc,
            )
        };
        self.trace_call("MQCONNX", cc, rc);
        check(cc, rc)?;
        Ok(Hconn(hconn))
    }

    fn disconnect(&mut self, hconn: Hconn) -> Result<(), Status> {
        let api = self.api()?;
        let (mut handle, mut cc, mut rc) = (hconn.0, 0, 0);
        // SAFETY: out-parameters point at live locals.
        unsafe { (api.disc)(&mut handle, &mut cc, &mut rc) };
        self.trace_call("MQDISC", cc, rc);
        check(cc, rc)
    }

    fn open(&mut self, hconn: Hconn, od: &mut Mqod, options: i32) -> Result<Hobj, Status> {
        let api = self.api()?;
        let mut raw = MQOD::from(&*od);
        let (mut hobj, mut cc, mut rc) = (MQHO_UNUSABLE_HOBJ, 0, 0);
        // SAFETY: `raw` outlives the call.
        unsafe { (api.open)(hconn.0, &mut raw, options, &mut hobj, &mut cc, &mut rc) };
        self.trace_call("MQOPEN", cc, rc);
        raw.copy_to(od);
        check(cc, rc)?;
        Ok(Hobj(hobj))
    }

    fn close(&mut self, hconn: Hconn, hobj: Hobj, options: i32) -> Result<(), Status> {
        let api = self.api()?;
        let (mut handle, mut cc, mut rc) = (hobj.0, 0, 0);
        // SAFETY: out-parameters point at live locals.
        unsafe { (api.close)(hconn.0, &mut handle, options, &mut cc, &mut rc) };
        self.trace_call("MQCLOSE", cc, rc);
        check(cc, rc)
    }

    fn put(
        &mut self,
        hconn: Hconn,
        hobj: Hobj,
        md: &mut Mqmd,
        pmo: &mut MqPmo,
        data: &[u8],
    ) -> Result<(), Status> {
        let api = self.api()?;
        let mut raw_md = MQMD::from(&*md);
        let mut raw_pmo = MQPMO::from(&*pmo);
        let (mut cc, mut rc) = (0, 0);
        // SAFETY: MQPUT reads `data` and does not retain it.
        unsafe {
            (api.put)(
                hconn.0,
                hobj.0,
                &mut raw_md,
                &mut raw_pmo,
                data.len() as MQLONG,
                data.as_ptr().cast_mut().cast::<c_void>(),
                &mut cc,
                &mut rc,
            )
        };
        self.trace_call("MQPUT", cc, rc);
        raw_md.copy_to(md);
        pmo.resolved_q_name = get_fixed(&raw_pmo.resolved_q_name);
        pmo.resolved_qmgr_name = get_fixed(&raw_pmo.resolved_q_mgr_name);
        check(cc, rc)
    }

    fn put1(
        &mut self,
        hconn: Hconn,
        od: &mut Mqod,
        md: &mut Mqmd,
        pmo: &mut MqPmo,
        data: &[u8],
    ) -> Result<(), Status> {
        let api = self.api()?;
        let mut raw_od = MQOD::from(&*od);
        let mut raw_md = MQMD::from(&*md);
        let mut raw_pmo = MQPMO::from(&*pmo);
        let (mut cc, mut rc) = (0, 0);
        // SAFETY: as for MQPUT.
        unsafe {
            (api.put1)(
                hconn.0,
                &mut raw_od,
                &mut raw_md,
                &mut raw_pmo,
                data.len() as MQLONG,
                data.as_ptr().cast_mut().cast::<c_void>(),
                &mut cc,
                &mut rc,
            )
        };
        self.trace_call("MQPUT1", cc, rc);
        raw_od.copy_to(od);
        raw_md.copy_to(md);
        pmo.resolved_q_name = get_fixed(&raw_pmo.resolved_q_name);
        pmo.resolved_qmgr_name = get_fixed(&raw_pmo.resolved_q_mgr_name);
        check(cc, rc)
    }

    fn get(
        &mut self,
        hconn: Hconn,
        hobj: Hobj,
        md: &mut Mqmd,
        gmo: &mut Mqgmo,
        buffer: &mut [u8],
        data_length: &mut usize,
    ) -> Result<(), Status> {
        let api = self.api()?;
        let mut raw_md = MQMD::from(&*md);
        let mut raw_gmo = MQGMO::from(&*gmo);
        let (mut length, mut cc, mut rc) = (0, 0, 0);
        let buffer_ptr = if buffer.is_empty() {
            ptr::null_mut()
        } else {
            buffer.as_mut_ptr().cast::<c_void>()
        };
        // SAFETY: `buffer` outlives the call and its length is passed.
        unsafe {
            (api.get)(
                hconn.0,
                hobj.0,
                &mut raw_md,
                &mut raw_gmo,
                buffer.len() as MQLONG,
                buffer_ptr,
                &mut length,
                &mut cc,
                &mut rc,
            )
        };
        self.trace_call("MQGET", cc, rc);
        raw_md.copy_to(md);
        gmo.resolved_q_name = get_fixed(&raw_gmo.resolved_q_name);
        *data_length = length.max(0) as usize;
        check(cc, rc)
    }

    fn inquire(&mut self, hconn: Hconn, hobj: Hobj, selectors: &[i32]) -> Result<Vec<i32>, Status> {
        let api = self.api()?;
        let mut selectors = selectors.to_vec();
        let mut values = vec![0; selectors.len()];
        let (mut cc, mut rc) = (0, 0);
        // SAFETY: both arrays outlive the call and their lengths are passed.
        unsafe {
            (api.inq)(
                hconn.0,
                hobj.0,
                selectors.len() as MQLONG,
                selectors.as_mut_ptr(),
                values.len() as MQLONG,
                values.as_mut_ptr(),
                0,
                ptr::null_mut(),
                &mut cc,
                &mut rc,
            )
        };
        self.trace_call("MQINQ", cc, rc);
        check(cc, rc)?;
        Ok(values)
    }

    fn set(&mut self, hconn: Hconn, hobj: Hobj, attributes: &[(i32, i32)]) -> Result<(), Status> {
        let api = self.api()?;
        let (mut selectors, mut values): (Vec<i32>, Vec<i32>) = attributes.iter().copied().unzip();
        let (mut cc, mut rc) = (0, 0);
        // SAFETY: as for MQINQ.
        unsafe {
            (api.set)(
                hconn.0,
                hobj.0,
                selectors.len() as MQLONG,
                selectors.as_mut_ptr(),
                values.len() as MQLONG,
                values.as_mut_ptr(),
                0,
                ptr::null_mut(),
                &mut cc,
                &mut rc,
            )
        };
        self.trace_call("MQSET", cc, rc);
        check(cc, rc)
    }

    fn begin(&mut self, hconn: Hconn) -> Result<(), Status> {
        let api = self.api()?;
        let (mut cc, mut rc) = (0, 0);
        // SAFETY: a null begin-options pointer selects the defaults.
        unsafe { (api.begin)(hconn.0, ptr::null_mut(), &mut cc, &mut rc) };
        self.trace_call("MQBEGIN", cc, rc);
        check(cc, rc)
    }

    fn commit(&mut self, hconn: Hconn) -> Result<(), Status> {
        let api = self.api()?;
        let (mut cc, mut rc) = (0, 0);
        // SAFETY: out-parameters point at live locals.
        unsafe { (api.cmit)(hconn.0, &mut cc, &mut rc) };
        self.trace_call("MQCMIT", cc, rc);
        check(cc, rc)
    }

    fn backout(&mut self, hconn: Hconn) -> Result<(), Status> {
        let api = self.api()?;
        let (mut cc, mut rc) = (0, 0);
        // SAFETY: out-parameters point at live locals.
        unsafe { (api.back)(hconn.0, &mut cc, &mut rc) };
        self.trace_call("MQBACK", cc, rc);
        check(cc, rc)
    }

    fn execute(&mut self, hconn: Hconn, command: &Command) -> Result<Vec<ResponseItem>, Status> {
        let api = self.api()?;
        let admin = Bag::create(api, MQCBO_ADMIN_BAG)?;
        let response = Bag::create(api, MQCBO_ADMIN_BAG)?;
        let (mut cc, mut rc) = (0, 0);

        for (selector, value) in &command.parameters {
            match value {
                BagValue::Integer(v) => {
                    // SAFETY: out-parameters point at live locals.
                    unsafe { (api.add_integer)(admin.handle, selector.0, *v, &mut cc, &mut rc) };
                }
                BagValue::String(s) => {
                    let text = c_string(s, MQRC_SELECTOR_ERROR)?;
                    // SAFETY: mqAddString copies the NUL-terminated text.
                    unsafe {
                        (api.add_string)(
                            admin.handle,
                            selector.0,
                            MQBL_NULL_TERMINATED,
                            text.as_ptr().cast_mut(),
                            &mut cc,
                            &mut rc,
                        )
                    };
                }
            }
            check(cc, rc)?;
        }
        for selector in &command.inquiries {
            // SAFETY: out-parameters point at live locals.
            unsafe { (api.add_inquiry)(admin.handle, selector.0, &mut cc, &mut rc) };
            check(cc, rc)?;
        }

        // SAFETY: both bags are live for the duration of the call.
        unsafe {
            (api.execute)(
                hconn.0,
                command.code.id(),
                MQHB_NONE,
                admin.handle,
                response.handle,
                MQHO_NONE,
                MQHO_NONE,
                &mut cc,
                &mut rc,
            )
        };
        self.trace_call("mqExecute", cc, rc);

        if cc != MQCC_OK {
            // The command server reports the real reason in the first nested bag.
            if rc == MQRCCF_COMMAND_FAILED {
                if let Ok(nested) = response.nested(0) {
                    if let (Ok(inner_cc), Ok(inner_rc)) = (
                        nested.integer(MQIASY_COMP_CODE, 0),
                        nested.integer(MQIASY_REASON, 0),
                    ) {
                        return Err(Status::new(inner_cc, inner_rc));
                    }
                }
            }
            return Err(Status::new(cc, rc));
        }

        let mut items = Vec::new();
        for index in 0..response.count(MQHA_BAG_HANDLE)? {
            items.push(response.nested(index)?.items()?);
        }
        Ok(items)
    }

    fn release(&mut self) {
        self.library.release();
    }
}
